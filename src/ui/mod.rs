pub mod dialogs;
pub mod history;
pub mod panels;
pub mod plot;
pub mod results;
