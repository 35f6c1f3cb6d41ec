fn main() {
    // HEAD / index が変わったら再実行
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let described = std::process::Command::new("git")
        .args(["describe", "--always", "--dirty", "--tags"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|v| !v.is_empty());

    // git が無い環境 (tarball ビルド) ではパッケージバージョンを使う
    let version = described.unwrap_or_else(|| {
        format!("v{}", std::env::var("CARGO_PKG_VERSION").unwrap_or_default())
    });

    println!("cargo:rustc-env=GIT_VERSION={}", version);
}
