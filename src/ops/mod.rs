pub mod explorer;
pub mod form;
pub mod layout;
pub mod timeline;
pub mod workspace;
