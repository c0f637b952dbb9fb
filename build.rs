fn main() {
    // `sqlx::migrate!` embeds these directories at compile time.
    println!("cargo:rerun-if-changed=migrations");
    println!("cargo:rerun-if-env-changed=SQLX_OFFLINE");
}
