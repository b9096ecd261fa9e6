//! `objfetch size <uri>` – best-effort size probe.

use objfetch_core::location::Location;
use objfetch_core::store::HttpStore;

pub fn run_size(store: &HttpStore, uri: &str) {
    // Size probes never fail: a malformed URI is reported as size 0, like
    // every other probe failure.
    let size = match Location::from_uri("http", uri) {
        Ok(location) => store.get_size(&location),
        Err(err) => {
            tracing::debug!("size probe for {} failed: {}", uri, err);
            0
        }
    };
    println!("{size}");
}
