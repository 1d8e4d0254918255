//! Traffic resources: what to fetch, how to fetch it, and how it normalizes.

pub mod fetch;
pub mod model;

pub use fetch::{Fetcher, HttpRequest, HttpResponse, ReqwestTransport, Transport, ACCEPT_V3};
pub use model::{
    midnight_utc, Asset, DailyRecord, FetchStrategy, Release, RepoInfo, Resource,
    ResourceDescriptor, ResourceKind, TrafficDay, TrafficWindow,
};
