pub mod capture;
pub mod cdp;
pub mod install;
pub mod session;
