// Dashboard widgets.

pub mod log_panel;
pub mod match_list;
pub mod status_bar;
