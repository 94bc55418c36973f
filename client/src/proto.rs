//! Wire types for the Cloud Logging v2 API.
//!
//! Generated by `build.rs` from the definitions under `proto/`: messages for
//! `google.logging.v2`, `google.logging.type` and
//! `google.api.MonitoredResource`, plus the `LoggingServiceV2` and
//! `ConfigServiceV2` client stubs. Well-known types map to `prost_types`.

// Include the generated protobuf code
#[allow(clippy::all)]
#[allow(clippy::pedantic)]
#[allow(missing_docs)]
pub mod google {
    //! Generated types, laid out by protobuf package.

    pub mod api {
        //! `google.api` types.
        #![allow(clippy::all)]
        #![allow(clippy::pedantic)]
        #![allow(missing_docs)]
        tonic::include_proto!("google.api");
    }

    pub mod logging {
        //! `google.logging` packages.

        pub mod r#type {
            //! `google.logging.type` types.
            #![allow(clippy::all)]
            #![allow(clippy::pedantic)]
            #![allow(missing_docs)]
            tonic::include_proto!("google.logging.r#type");
        }

        pub mod v2 {
            //! `google.logging.v2` messages and service stubs.
            #![allow(clippy::all)]
            #![allow(clippy::pedantic)]
            #![allow(missing_docs)]
            tonic::include_proto!("google.logging.v2");
        }
    }
}

pub use google::api;
pub use google::logging::r#type as logging_type;
pub use google::logging::v2;
