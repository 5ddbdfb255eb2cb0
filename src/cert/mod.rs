// src/cert/mod.rs
mod api_server;
mod ca;
pub mod kubelet;
mod material;
pub mod openssl;
mod pki;
mod types;

pub use material::CaCertificate;
pub use pki::{OpensslPki, PkiBundle, PkiGenerator, PkiRequest};
