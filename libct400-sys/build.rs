fn main() {
    println!("cargo:rerun-if-changed=src/bindings.rs");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=CT400_LIB_DIR");

    // The no_api build replaces the vendor driver with the mock module, so
    // there is nothing to link against.
    if std::env::var_os("CARGO_FEATURE_NO_API").is_some() {
        return;
    }

    if let Some(dir) = std::env::var_os("CT400_LIB_DIR") {
        println!("cargo:rustc-link-search={}", dir.to_string_lossy());
    }
    println!("cargo:rustc-link-lib=CT400_lib");
}
