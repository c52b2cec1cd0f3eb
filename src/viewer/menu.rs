// Menu module
// Menu bar model: entries, accelerators, layout and hit testing

use super::font::text_width;
use super::zoom::Zoom;

/// Height of the menu bar strip at the top of the window
pub const MENU_BAR_HEIGHT: u32 = 22;

/// Horizontal padding around a menu title
pub const HEADER_PADDING: u32 = 10;

/// Width of an open drop-down menu
pub const DROPDOWN_WIDTH: u32 = 180;

/// Height of one drop-down entry
pub const ITEM_HEIGHT: u32 = 25;

/// What a menu entry does when chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    SaveAs,
    Close,
    SetZoom(Zoom),
}

/// Keyboard shortcut: the primary modifier (Ctrl, or the logo key) plus a letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accelerator {
    pub key: char,
}

impl Accelerator {
    pub fn label(&self) -> String {
        format!("Ctrl+{}", self.key.to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub action: MenuAction,
    pub accelerator: Option<Accelerator>,
    /// `Some` for radio entries, holding whether the entry is selected
    pub selected: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub title: &'static str,
    pub items: Vec<MenuItem>,
}

/// The File and Display menus, with the radio group reflecting `zoom`
pub fn menus(zoom: Zoom) -> Vec<Menu> {
    let file = Menu {
        title: "File",
        items: vec![
            MenuItem {
                label: "Save image as...",
                action: MenuAction::SaveAs,
                accelerator: Some(Accelerator { key: 's' }),
                selected: None,
            },
            MenuItem {
                label: "Close",
                action: MenuAction::Close,
                accelerator: Some(Accelerator { key: 'q' }),
                selected: None,
            },
        ],
    };
    let display = Menu {
        title: "Display",
        items: Zoom::ALL
            .into_iter()
            .map(|level| MenuItem {
                label: level.label(),
                action: MenuAction::SetZoom(level),
                accelerator: None,
                selected: Some(level == zoom),
            })
            .collect(),
    };
    vec![file, display]
}

/// Action bound to `key` pressed with the primary modifier
pub fn accelerator_action(key: char, primary_modifier: bool) -> Option<MenuAction> {
    if !primary_modifier {
        return None;
    }
    let key = key.to_ascii_lowercase();
    menus(Zoom::default())
        .into_iter()
        .flat_map(|menu| menu.items)
        .find(|item| item.accelerator.is_some_and(|acc| acc.key == key))
        .map(|item| item.action)
}

/// Axis-aligned rectangle in window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x as f64
            && py >= self.y as f64
            && px < self.x as f64 + self.width as f64
            && py < self.y as f64 + self.height as f64
    }
}

/// What lies under a pointer position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuHit {
    Header(usize),
    Item { menu: usize, item: usize },
    Nothing,
}

/// Menu bar state of one window: which drop-down is open and which entry
/// is hovered
#[derive(Debug, Clone)]
pub struct MenuBar {
    menus: Vec<Menu>,
    open: Option<usize>,
    hover: Option<usize>,
}

impl MenuBar {
    pub fn new(zoom: Zoom) -> Self {
        Self {
            menus: menus(zoom),
            open: None,
            hover: None,
        }
    }

    pub fn menus(&self) -> &[Menu] {
        &self.menus
    }

    pub fn open_menu(&self) -> Option<usize> {
        self.open
    }

    pub fn hovered_item(&self) -> Option<usize> {
        self.hover
    }

    pub fn close(&mut self) {
        self.open = None;
        self.hover = None;
    }

    pub fn header_rect(&self, index: usize) -> Rect {
        let x: u32 = self.menus[..index]
            .iter()
            .map(|menu| header_width(menu.title))
            .sum();
        Rect::new(x as i32, 0, header_width(self.menus[index].title), MENU_BAR_HEIGHT)
    }

    pub fn dropdown_rect(&self, index: usize) -> Rect {
        let header = self.header_rect(index);
        let height = self.menus[index].items.len() as u32 * ITEM_HEIGHT;
        Rect::new(header.x, MENU_BAR_HEIGHT as i32, DROPDOWN_WIDTH, height)
    }

    pub fn item_rect(&self, menu: usize, item: usize) -> Rect {
        let dropdown = self.dropdown_rect(menu);
        Rect::new(
            dropdown.x,
            dropdown.y + (item as u32 * ITEM_HEIGHT) as i32,
            DROPDOWN_WIDTH,
            ITEM_HEIGHT,
        )
    }

    /// Narrowest window that still shows every menu title and drop-down
    pub fn min_width(&self) -> u32 {
        let headers: u32 = self.menus.iter().map(|menu| header_width(menu.title)).sum();
        (0..self.menus.len())
            .map(|index| {
                let dropdown = self.dropdown_rect(index);
                dropdown.x.max(0) as u32 + dropdown.width
            })
            .fold(headers, u32::max)
    }

    /// Shortest window that still fits the tallest drop-down below the bar
    pub fn min_height(&self) -> u32 {
        (0..self.menus.len())
            .map(|index| {
                let dropdown = self.dropdown_rect(index);
                dropdown.y.max(0) as u32 + dropdown.height
            })
            .fold(MENU_BAR_HEIGHT, u32::max)
    }

    pub fn hit_test(&self, x: f64, y: f64) -> MenuHit {
        if let Some(menu) = self.open {
            if self.dropdown_rect(menu).contains(x, y) {
                let item = ((y - MENU_BAR_HEIGHT as f64) / ITEM_HEIGHT as f64) as usize;
                if item < self.menus[menu].items.len() {
                    return MenuHit::Item { menu, item };
                }
            }
        }
        (0..self.menus.len())
            .find(|&index| self.header_rect(index).contains(x, y))
            .map_or(MenuHit::Nothing, MenuHit::Header)
    }

    /// Handle a primary click; returns the chosen action, if any.
    ///
    /// Clicking a title toggles its drop-down, clicking an entry chooses it
    /// and clicking elsewhere closes the open drop-down.
    pub fn click(&mut self, x: f64, y: f64) -> Option<MenuAction> {
        match self.hit_test(x, y) {
            MenuHit::Header(index) => {
                self.open = if self.open == Some(index) { None } else { Some(index) };
                self.hover = None;
                None
            }
            MenuHit::Item { menu, item } => {
                let action = self.menus[menu].items[item].action;
                self.close();
                Some(action)
            }
            MenuHit::Nothing => {
                self.close();
                None
            }
        }
    }

    /// Track the pointer; returns true when the highlighted entry changed
    pub fn hover(&mut self, x: f64, y: f64) -> bool {
        let hover = match self.hit_test(x, y) {
            MenuHit::Item { item, .. } => Some(item),
            _ => None,
        };
        let changed = hover != self.hover;
        self.hover = hover;
        changed
    }
}

fn header_width(title: &str) -> u32 {
    text_width(title) + 2 * HEADER_PADDING
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_menu_marks_current_zoom() {
        let menus = menus(Zoom::Half);
        let display = &menus[1];
        assert_eq!(display.title, "Display");
        let selected: Vec<_> = display
            .items
            .iter()
            .filter(|item| item.selected == Some(true))
            .map(|item| item.label)
            .collect();
        assert_eq!(selected, vec!["50 %"]);
    }

    #[test]
    fn accelerators_need_the_primary_modifier() {
        assert_eq!(accelerator_action('s', true), Some(MenuAction::SaveAs));
        assert_eq!(accelerator_action('Q', true), Some(MenuAction::Close));
        assert_eq!(accelerator_action('s', false), None);
        assert_eq!(accelerator_action('x', true), None);
    }

    #[test]
    fn accelerator_labels() {
        assert_eq!(Accelerator { key: 's' }.label(), "Ctrl+S");
    }

    #[test]
    fn headers_are_laid_out_left_to_right() {
        let bar = MenuBar::new(Zoom::Full);
        let file = bar.header_rect(0);
        let display = bar.header_rect(1);
        assert_eq!(file.x, 0);
        assert_eq!(display.x, file.width as i32);
    }

    #[test]
    fn minimum_size_fits_every_dropdown() {
        let bar = MenuBar::new(Zoom::Full);
        let display = bar.dropdown_rect(1);
        assert_eq!(bar.min_width(), display.x as u32 + DROPDOWN_WIDTH);
        assert_eq!(bar.min_height(), MENU_BAR_HEIGHT + 4 * ITEM_HEIGHT);
        assert!(bar.min_width() >= bar.header_rect(1).x as u32 + bar.header_rect(1).width);
    }

    #[test]
    fn clicking_through_the_display_menu_picks_a_zoom() {
        let mut bar = MenuBar::new(Zoom::Full);
        let header = bar.header_rect(1);
        assert_eq!(bar.click(header.x as f64 + 2.0, 5.0), None);
        assert_eq!(bar.open_menu(), Some(1));

        let entry = bar.item_rect(1, 2);
        let (x, y) = (entry.x as f64 + 5.0, entry.y as f64 + 5.0);
        assert!(bar.hover(x, y));
        assert_eq!(bar.hovered_item(), Some(2));
        assert!(!bar.hover(x, y));

        assert_eq!(bar.click(x, y), Some(MenuAction::SetZoom(Zoom::Half)));
        assert_eq!(bar.open_menu(), None);
    }

    #[test]
    fn entries_are_inert_while_their_menu_is_closed() {
        let mut bar = MenuBar::new(Zoom::Full);
        let entry = bar.item_rect(0, 0);
        assert_eq!(bar.hit_test(entry.x as f64 + 1.0, entry.y as f64 + 1.0), MenuHit::Nothing);
        assert_eq!(bar.click(entry.x as f64 + 1.0, entry.y as f64 + 1.0), None);
    }

    #[test]
    fn clicking_outside_closes_and_header_toggles() {
        let mut bar = MenuBar::new(Zoom::Full);
        bar.click(2.0, 2.0);
        assert_eq!(bar.open_menu(), Some(0));
        bar.click(2.0, 2.0);
        assert_eq!(bar.open_menu(), None);

        bar.click(2.0, 2.0);
        bar.click(500.0, 500.0);
        assert_eq!(bar.open_menu(), None);
    }

    #[test]
    fn file_menu_entries() {
        let mut bar = MenuBar::new(Zoom::Full);
        bar.click(2.0, 2.0);
        let save = bar.item_rect(0, 0);
        assert_eq!(
            bar.hit_test(save.x as f64 + 3.0, save.y as f64 + 3.0),
            MenuHit::Item { menu: 0, item: 0 }
        );
        let close = bar.item_rect(0, 1);
        assert_eq!(bar.click(close.x as f64 + 3.0, close.y as f64 + 3.0), Some(MenuAction::Close));
    }
}
