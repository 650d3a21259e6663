// Services module for business logic
pub mod command_dispatcher;
pub mod package_installer;
pub mod registry_client;
pub mod root_file_locator;
pub mod tarball_installer;
pub mod update_notifier;
