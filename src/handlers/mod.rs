pub mod change_password;
pub mod health;
pub mod login;
pub mod logout;
pub mod password_reset;
pub mod profile;
pub mod register;

pub use change_password::change_password;
pub use health::health_check;
pub use login::{login, login_status};
pub use logout::logout;
pub use password_reset::{forgot_password, reset_password};
pub use profile::{get_user, update_user};
pub use register::register;
