pub mod email;
pub mod person_name;
pub mod role;
pub mod username;

pub use email::Email;
pub use person_name::PersonName;
pub use role::Role;
pub use username::Username;
