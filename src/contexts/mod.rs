//! Feature modules shipped with the host.
//!
//! ```text
//! Welcome            GET /hello/{name}
//! UserManagement     /users     (exports UserRepository, UserService)
//! ProductManagement  /products  (imports UserManagement)
//! ```

pub mod products;
pub mod users;
pub mod welcome;

use std::sync::Arc;

use crate::di::Module;

pub use products::ProductManagementModule;
pub use users::UserManagementModule;
pub use welcome::WelcomeModule;

/// The modules the binary registers, in registration order.
pub fn default_modules() -> Vec<Arc<dyn Module>> {
    let users = Arc::new(UserManagementModule::new());
    let welcome: Arc<dyn Module> = Arc::new(WelcomeModule);
    let products: Arc<dyn Module> = Arc::new(ProductManagementModule::new(Arc::clone(&users)));
    let users: Arc<dyn Module> = users;
    vec![welcome, users, products]
}
