// Build script for the keychain crate
// Links the Security framework on Apple targets, where the item calls live.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let target = env::var("TARGET").unwrap_or_default();

    if target.contains("apple") {
        println!("cargo:rustc-link-lib=framework=Security");
        println!("cargo:rustc-link-lib=framework=CoreFoundation");
    }

    println!("cargo:rustc-env=BUILD_TARGET={}", target);
}
