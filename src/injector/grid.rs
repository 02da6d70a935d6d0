//! Row and column reordering for the table toolbar.

use crate::froala::{snapshot_undo_state, trigger_content_changed};
use crate::util::{as_html, deep_clone, document, document_elements_by_class, elements_by_class};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

const TABLE_TOOLBAR_MARKER: &str = "tableHeader-";
const ROWS_MENU_PREFIX: &str = "tableRows-";
const COLUMNS_MENU_PREFIX: &str = "tableColumns-";

/// The stock rows/columns dropdowns have three entries each.
const STOCK_ITEM_COUNT: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum GridMove {
    RowUp,
    RowDown,
    ColumnLeft,
    ColumnRight,
}

impl GridMove {
    fn title(self) -> &'static str {
        match self {
            GridMove::RowUp => "Move row up",
            GridMove::RowDown => "Move row down",
            GridMove::ColumnLeft => "Move column left",
            GridMove::ColumnRight => "Move column right",
        }
    }

    fn run(self) {
        match self {
            GridMove::RowUp => move_selected_row(true),
            GridMove::RowDown => move_selected_row(false),
            GridMove::ColumnLeft => move_selected_column(true),
            GridMove::ColumnRight => move_selected_column(false),
        }
    }
}

/// Index a column lands on when shifted one step, if it stays inside the row.
pub(crate) fn column_move_target(from: i32, left: bool, column_count: u32) -> Option<u32> {
    let to = if left { from - 1 } else { from + 1 };
    if from < 0 || to < 0 || to as u32 >= column_count {
        return None;
    }
    Some(to as u32)
}

pub(crate) fn augment_grid_toolbars(doc: &web_sys::Document) {
    for toolbar in document_elements_by_class(doc, "fr-buttons") {
        let is_table_toolbar = toolbar
            .first_element_child()
            .is_some_and(|b| b.id().starts_with(TABLE_TOOLBAR_MARKER));
        if !is_table_toolbar {
            continue;
        }

        for menu in elements_by_class(&toolbar, "fr-dropdown-menu") {
            augment_dropdown(&menu);
        }
    }
}

/// Appends the move entries to a rows/columns dropdown once. Returns whether
/// anything was added.
pub(crate) fn augment_dropdown(menu: &web_sys::Element) -> bool {
    let Some(labelled_by) = menu.get_attribute("aria-labelledby") else {
        return false;
    };
    let Ok(Some(list)) = menu.query_selector("ul") else {
        return false;
    };

    if list.child_element_count() > STOCK_ITEM_COUNT {
        return false;
    }

    let moves = if labelled_by.starts_with(ROWS_MENU_PREFIX) {
        [GridMove::RowUp, GridMove::RowDown]
    } else if labelled_by.starts_with(COLUMNS_MENU_PREFIX) {
        [GridMove::ColumnLeft, GridMove::ColumnRight]
    } else {
        return false;
    };

    let Some(template) = list.first_element_child() else {
        return false;
    };

    for mv in moves {
        if let Some(item) = menu_item(&template, mv) {
            let _ = list.append_child(&item);
        }
    }
    true
}

fn menu_item(template: &web_sys::Element, mv: GridMove) -> Option<web_sys::Element> {
    let item: web_sys::Element = deep_clone(template)?;

    if let Some(inner) = item.first_element_child().as_ref().and_then(as_html) {
        inner.set_title(mv.title());
        inner.set_inner_text(mv.title());
        let _ = inner.set_attribute("data-cmd", "");
    }

    let cb = Closure::<dyn FnMut(web_sys::Event)>::new(move |_ev: web_sys::Event| mv.run());
    let _ = item.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref());
    cb.forget();

    Some(item)
}

fn selected_cell() -> Option<web_sys::HtmlTableCellElement> {
    let doc = document()?;
    let cells = document_elements_by_class(&doc, "fr-selected-cell");
    if cells.len() != 1 {
        return None;
    }
    cells.into_iter().next()?.dyn_into().ok()
}

fn move_selected_row(up: bool) {
    let Some(cell) = selected_cell() else {
        return;
    };

    // Header rows stay put.
    if cell.tag_name().eq_ignore_ascii_case("th") {
        return;
    }

    let Some(row) = cell.parent_element() else {
        return;
    };
    let Some(body) = row.parent_element() else {
        return;
    };

    let neighbor = if up {
        row.previous_element_sibling()
    } else {
        row.next_element_sibling()
    };
    let Some(neighbor) = neighbor else {
        return;
    };

    snapshot_undo_state(&cell, true);

    let moved = if up {
        body.insert_before(&row, Some(&neighbor))
    } else {
        body.insert_before(&neighbor, Some(&row))
    };
    if let Err(e) = moved {
        tracing::warn!("Could not move row: {e:?}");
        return;
    }

    snapshot_undo_state(&cell, false);
    trigger_content_changed(&cell);
}

fn move_selected_column(left: bool) {
    let Some(cell) = selected_cell() else {
        return;
    };

    let Some(row) = cell
        .parent_element()
        .and_then(|r| r.dyn_into::<web_sys::HtmlTableRowElement>().ok())
    else {
        return;
    };
    let Some(table) = cell
        .closest("table")
        .ok()
        .flatten()
        .and_then(|t| t.dyn_into::<web_sys::HtmlTableElement>().ok())
    else {
        return;
    };

    let from = cell.cell_index();
    let Some(to) = column_move_target(from, left, row.cells().length()) else {
        return;
    };
    let from = from as u32;

    snapshot_undo_state(&table, true);

    // Every row of every section, each exactly once.
    let rows = table.rows();
    for i in 0..rows.length() {
        if let Some(r) = rows
            .item(i)
            .and_then(|r| r.dyn_into::<web_sys::HtmlTableRowElement>().ok())
        {
            move_cell(&r, from, to);
        }
    }

    snapshot_undo_state(&table, false);
    trigger_content_changed(&table);
}

fn move_cell(row: &web_sys::HtmlTableRowElement, from: u32, to: u32) {
    let cells = row.cells();
    let (Some(moving), Some(target)) = (cells.item(from), cells.item(to)) else {
        return;
    };

    let reference: Option<web_sys::Node> = if to < from {
        Some(target.into())
    } else {
        target.next_sibling()
    };
    let _ = row.insert_before(&moving, reference.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_move_inside_row() {
        assert_eq!(column_move_target(1, true, 3), Some(0));
        assert_eq!(column_move_target(1, false, 3), Some(2));
    }

    #[test]
    fn test_column_move_at_edges() {
        assert_eq!(column_move_target(0, true, 3), None);
        assert_eq!(column_move_target(2, false, 3), None);
    }

    #[test]
    fn test_column_move_detached_cell() {
        assert_eq!(column_move_target(-1, false, 3), None);
    }
}
