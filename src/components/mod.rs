pub mod edit_colors;

pub(crate) use edit_colors::show_edit_colors_dialog;
