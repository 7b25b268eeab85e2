use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/rust/ffi.rs");

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()));
    let include_dir = crate_dir.join("include");
    let header = include_dir.join("emotion_classifier.h");

    let result = cbindgen::Builder::new()
        .with_src(crate_dir.join("src/rust/ffi.rs"))
        .with_language(cbindgen::Language::C)
        .with_include_guard("EMOTION_CLASSIFIER_H")
        .with_documentation(true)
        .generate();

    match result {
        Ok(bindings) => {
            if let Err(e) = std::fs::create_dir_all(&include_dir) {
                println!("cargo:warning=Unable to create {:?}: {}", include_dir, e);
                return;
            }
            bindings.write_to_file(header);
        }
        // A missing header does not fail the build.
        Err(e) => println!("cargo:warning=Unable to generate C header: {}", e),
    }
}
