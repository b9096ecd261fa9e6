//! `objfetch schemes` – list supported URI schemes.

use objfetch_core::store::HttpStore;

pub fn run_schemes(store: &HttpStore) {
    for scheme in store.get_schemes() {
        println!("{scheme}");
    }
}
