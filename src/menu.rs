use strum::{Display, EnumIter, IntoEnumIterator};

pub const HINT: &str = "j/k/Arrows: Navigate | Enter: Select | q/ESC: Back";

/// An ordered list of labels with one highlighted entry.
///
/// The highlight is clamped to the item range, it never wraps around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub title: String,
    pub hint: Option<String>,
    pub items: Vec<String>,
    highlight: usize,
}

impl Menu {
    pub fn new(title: impl Into<String>, items: Vec<String>) -> Self {
        debug_assert!(!items.is_empty(), "menus are never empty");
        Self {
            title: title.into(),
            hint: Some(HINT.to_string()),
            items,
            highlight: 0,
        }
    }

    pub fn without_hint(mut self) -> Self {
        self.hint = None;
        self
    }

    pub fn highlight(&self) -> usize {
        self.highlight
    }

    pub fn next(&mut self) {
        if self.highlight + 1 < self.items.len() {
            self.highlight += 1;
        }
    }

    pub fn previous(&mut self) {
        self.highlight = self.highlight.saturating_sub(1);
    }

    /// Moves the highlight to `index`. Out of range indexes are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.highlight = index;
            true
        } else {
            false
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.items.get(self.highlight).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    Main,
    Wifi,
    Bluetooth,
}

impl MenuKind {
    pub fn menu(self) -> Menu {
        match self {
            MenuKind::Main => Menu::new("", labels::<MainAction>()).without_hint(),
            MenuKind::Wifi => Menu::new("Wi-Fi Manager", labels::<WifiAction>()),
            MenuKind::Bluetooth => Menu::new("Bluetooth Manager", labels::<BluetoothAction>()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum MainAction {
    #[strum(to_string = "Wi-Fi Manager")]
    Wifi,
    #[strum(to_string = "Bluetooth Manager")]
    Bluetooth,
    Help,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum WifiAction {
    #[strum(to_string = "Scan for Networks")]
    Scan,
    #[strum(to_string = "List & Connect")]
    Connect,
    #[strum(to_string = "Show Status")]
    Status,
    Disconnect,
    #[strum(to_string = "Forget a Network")]
    Forget,
    #[strum(to_string = "Radio On/Off")]
    Radio,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum BluetoothAction {
    #[strum(to_string = "Power On/Off")]
    Power,
    #[strum(to_string = "Scan for Devices")]
    Scan,
    #[strum(to_string = "List/Pair/Connect")]
    Connect,
    Disconnect,
    #[strum(to_string = "Radio On/Off")]
    Radio,
    Back,
}

pub fn labels<T: IntoEnumIterator + ToString>() -> Vec<String> {
    T::iter().map(|item| item.to_string()).collect()
}

pub fn action_at<T: IntoEnumIterator>(index: usize) -> Option<T> {
    T::iter().nth(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(count: usize) -> Menu {
        Menu::new("test", (0..count).map(|i| format!("item {i}")).collect())
    }

    #[test]
    fn highlight_is_clamped_at_both_ends() {
        let mut menu = menu(3);
        menu.previous();
        assert_eq!(menu.highlight(), 0);

        for _ in 0..10 {
            menu.next();
        }
        assert_eq!(menu.highlight(), 2);
    }

    #[test]
    fn highlight_stays_in_bounds_for_any_sequence() {
        for count in 1..6 {
            let mut menu = menu(count);
            // deterministic pseudo random walk
            let mut seed: u32 = 0x2545_f491;
            for _ in 0..200 {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                if seed % 2 == 0 {
                    menu.next();
                } else {
                    menu.previous();
                }
                assert!(menu.highlight() < count);
            }
        }
    }

    #[test]
    fn select_ignores_out_of_range() {
        let mut menu = menu(4);
        assert!(menu.select(3));
        assert_eq!(menu.selected(), Some("item 3"));
        assert!(!menu.select(4));
        assert_eq!(menu.highlight(), 3);
    }

    #[test]
    fn menu_kinds_list_their_actions() {
        let wifi = MenuKind::Wifi.menu();
        assert_eq!(wifi.title, "Wi-Fi Manager");
        assert_eq!(wifi.items.first().map(String::as_str), Some("Scan for Networks"));
        assert_eq!(wifi.items.last().map(String::as_str), Some("Back"));

        let main = MenuKind::Main.menu();
        assert_eq!(main.items, ["Wi-Fi Manager", "Bluetooth Manager", "Help", "Exit"]);
        assert!(main.hint.is_none());
    }

    #[test]
    fn action_lookup_by_index() {
        assert_eq!(action_at::<BluetoothAction>(2), Some(BluetoothAction::Connect));
        assert_eq!(action_at::<MainAction>(3), Some(MainAction::Exit));
        assert_eq!(action_at::<MainAction>(4), None);
    }
}
