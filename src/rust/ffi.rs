//! C interface for native front ends.
//!
//! ```c
//! EmotionClassifier *clf = emotion_classifier_new("/opt/herta");
//! char *label = emotion_classifier_predict(clf, "i feel wonderful today");
//! /* label is a class name or "error" */
//! emotion_classifier_string_free(label);
//! emotion_classifier_free(clf);
//! ```
//!
//! Strings returned by this module are owned by the caller and must be
//! released with [`emotion_classifier_string_free`].

use std::ffi::{c_char, CStr, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::ptr;
use log::error;

use crate::classifier::{Classifier, ClassifierError, ERROR_SENTINEL};
use crate::config::ClassifierConfig;

/// Opaque classifier handle.
pub struct EmotionClassifier {
    inner: Classifier,
}

/// Creates a classifier reading `model.onnx`, `word_index.txt` and
/// `labels.txt` from `base_dir` (the working directory when NULL).
///
/// The model is opened on the first prediction. Returns NULL on failure.
///
/// # Safety
/// `base_dir` must be NULL or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn emotion_classifier_new(base_dir: *const c_char) -> *mut EmotionClassifier {
    let base_dir = if base_dir.is_null() {
        PathBuf::from(".")
    } else {
        match CStr::from_ptr(base_dir).to_str() {
            Ok(dir) => PathBuf::from(dir),
            Err(e) => {
                error!("Base directory is not valid UTF-8: {}", e);
                return ptr::null_mut();
            }
        }
    };
    into_handle(|| Classifier::from_config(&ClassifierConfig::from_base_dir(base_dir)))
}

/// Creates a classifier from a JSON config file. Returns NULL on failure.
///
/// # Safety
/// `config_path` must be a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn emotion_classifier_from_config(config_path: *const c_char) -> *mut EmotionClassifier {
    if config_path.is_null() {
        return ptr::null_mut();
    }
    let path = match CStr::from_ptr(config_path).to_str() {
        Ok(path) => path.to_string(),
        Err(e) => {
            error!("Config path is not valid UTF-8: {}", e);
            return ptr::null_mut();
        }
    };
    into_handle(|| ClassifierConfig::from_json_file(&path).and_then(|config| Classifier::from_config(&config)))
}

/// Classifies `text`, returning the label or `"error"`.
///
/// Never returns NULL. Free the result with [`emotion_classifier_string_free`].
///
/// # Safety
/// `handle` must come from one of the constructors and not be freed yet;
/// `text` must be NULL or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn emotion_classifier_predict(
    handle: *const EmotionClassifier,
    text: *const c_char,
) -> *mut c_char {
    let label = catch_unwind(AssertUnwindSafe(|| {
        let Some(classifier) = handle.as_ref() else {
            error!("emotion_classifier_predict called with a NULL handle");
            return ERROR_SENTINEL.to_string();
        };
        match read_text(text) {
            Ok(text) => classifier.inner.predict(text),
            Err(e) => {
                error!("Prediction failed [{}]: {}", e.kind(), e);
                ERROR_SENTINEL.to_string()
            }
        }
    }))
    .unwrap_or_else(|_| {
        error!("Prediction panicked");
        ERROR_SENTINEL.to_string()
    });

    CString::new(label)
        .or_else(|_| CString::new(ERROR_SENTINEL))
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

/// Releases a string returned by [`emotion_classifier_predict`].
///
/// # Safety
/// `s` must be NULL or a pointer returned by this library, freed only once.
#[no_mangle]
pub unsafe extern "C" fn emotion_classifier_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Releases a classifier handle.
///
/// # Safety
/// `handle` must be NULL or a pointer returned by a constructor, freed only once.
#[no_mangle]
pub unsafe extern "C" fn emotion_classifier_free(handle: *mut EmotionClassifier) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

fn into_handle(build: impl FnOnce() -> Result<Classifier, ClassifierError>) -> *mut EmotionClassifier {
    match catch_unwind(AssertUnwindSafe(build)) {
        Ok(Ok(inner)) => Box::into_raw(Box::new(EmotionClassifier { inner })),
        Ok(Err(e)) => {
            error!("Failed to create classifier: {}", e);
            ptr::null_mut()
        }
        Err(_) => {
            error!("Classifier construction panicked");
            ptr::null_mut()
        }
    }
}

unsafe fn read_text<'a>(text: *const c_char) -> Result<&'a str, ClassifierError> {
    if text.is_null() {
        return Err(ClassifierError::ValidationError("Input text is NULL".into()));
    }
    CStr::from_ptr(text)
        .to_str()
        .map_err(|e| ClassifierError::ValidationError(format!("Input text is not valid UTF-8: {}", e)))
}
