//! Presentation state for front ends showing predictions.
//!
//! The classifier itself is stateless; a front end that wants a mood to show
//! keeps a [`DisplayState`] and advances it from its own events and the label
//! strings returned by [`Classifier::predict`](crate::Classifier::predict).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayState {
    /// Nothing typed, or nothing recognizable predicted
    #[default]
    Welcome,
    /// Input is being edited
    Thinking,
    Happy,
    Sad,
    Angry,
    Fear,
}

impl DisplayState {
    /// State for a prediction result. Unknown labels and the error sentinel
    /// fall back to [`DisplayState::Welcome`].
    pub fn from_prediction(label: &str) -> Self {
        match label {
            "joy" => Self::Happy,
            "sadness" => Self::Sad,
            "anger" => Self::Angry,
            "fear" => Self::Fear,
            _ => Self::Welcome,
        }
    }

    /// State after the input text changed.
    pub fn on_input_changed(input: &str) -> Self {
        if input.is_empty() {
            Self::Welcome
        } else {
            Self::Thinking
        }
    }

    pub fn on_clear() -> Self {
        Self::Welcome
    }

    /// Line shown to the user for a prediction result.
    pub fn message(label: &str) -> String {
        if label == crate::ERROR_SENTINEL {
            "Prediction failed, please try again.".to_string()
        } else {
            format!("Predicted emotion: {}", label)
        }
    }
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Welcome => "welcome",
            Self::Thinking => "thinking",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Fear => "fear",
        };
        f.write_str(name)
    }
}
