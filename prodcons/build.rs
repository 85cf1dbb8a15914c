use grev::git_revision_auto;

fn main() {
    let revision = git_revision_auto("..")
        .ok()
        .flatten()
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=PRODCONS_REVISION={revision}");
}
