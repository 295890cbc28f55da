pub mod sessions_flow;
pub mod snapshot_etag;
