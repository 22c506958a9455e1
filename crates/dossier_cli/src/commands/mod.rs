pub(crate) mod components;
pub(crate) mod deltas;
pub(crate) mod dev;
pub(crate) mod docs;
pub(crate) mod export;
pub(crate) mod github;
pub(crate) mod limits;
pub(crate) mod meta;
#[cfg(feature = "migrate")]
pub(crate) mod migrate;
pub(crate) mod projects;
pub(crate) mod serve;
pub(crate) mod settings;
pub(crate) mod shared;
