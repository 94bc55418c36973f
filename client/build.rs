//! Build script for compiling the Cloud Logging v2 protobuf definitions.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tell cargo to rerun this build script if proto files change
    println!("cargo:rerun-if-changed=proto/");

    let proto_files = &[
        "proto/google/api/monitored_resource.proto",
        "proto/google/logging/type/http_request.proto",
        "proto/google/logging/type/log_severity.proto",
        "proto/google/logging/v2/log_entry.proto",
        "proto/google/logging/v2/logging.proto",
        "proto/google/logging/v2/logging_config.proto",
    ];

    let proto_include_dirs = &["proto"];

    // Only the client stubs are needed; the in-memory transport stands in
    // for the service
    tonic_prost_build::configure()
        .build_server(false)
        .emit_rerun_if_changed(false)
        .compile_protos(proto_files, proto_include_dirs)?;

    Ok(())
}
