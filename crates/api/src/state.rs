//! Shared application state.

use document_store::DocumentStore;
use domain::{CartService, CatalogRepository, OrderService, ProfileService, WishlistStore};

/// Services shared by all handlers, each over the same document store.
pub struct AppState<S: DocumentStore> {
    pub catalog: CatalogRepository<S>,
    pub carts: CartService<S>,
    pub orders: OrderService<S>,
    pub wishlist: WishlistStore<S>,
    pub profiles: ProfileService<S>,
}

impl<S: DocumentStore + Clone> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            catalog: CatalogRepository::new(store.clone()),
            carts: CartService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            wishlist: WishlistStore::new(store.clone()),
            profiles: ProfileService::new(store),
        }
    }
}
