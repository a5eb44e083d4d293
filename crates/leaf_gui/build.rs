use std::env;

fn main() {
    let version =
        env::var("LEAF_LENS_VERSION").unwrap_or_else(|_| env::var("CARGO_PKG_VERSION").unwrap());
    println!("cargo:rustc-env=LEAF_LENS_VERSION={version}");
    // The endpoint is embedded with option_env!; rebuild when it changes.
    println!("cargo:rerun-if-env-changed=LEAF_API_URL");
    println!("cargo:rerun-if-env-changed=LEAF_LENS_VERSION");
}
