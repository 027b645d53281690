use std::env;

fn main() {
    let target = env::var("TARGET").unwrap_or_default();

    // Linker scripts only apply to the firmware image; host builds and tests link normally.
    if env::var_os("CARGO_FEATURE_FIRMWARE").is_some() && target.starts_with("thumb") {
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    println!("cargo:rerun-if-changed=build.rs");
}
