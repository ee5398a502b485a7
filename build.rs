fn main() {
    println!("cargo:rerun-if-changed=sdkconfig.defaults");

    // Host builds (tests, simulation) never link ESP-IDF.
    #[cfg(feature = "espidf")]
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
