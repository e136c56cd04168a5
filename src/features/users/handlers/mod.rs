pub mod user_handler;

pub use user_handler::{__path_get_user, __path_list_contacts, get_user, list_contacts};
