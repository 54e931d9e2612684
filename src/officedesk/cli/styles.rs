use console::Style;
use once_cell::sync::Lazy;

pub struct DeskTheme {
    pub header: Style,
    pub id: Style,
    pub muted: Style,
    pub column_title: Style,
    pub card_title: Style,
    pub unassigned: Style,
}

pub static DESK_THEME: Lazy<DeskTheme> = Lazy::new(|| DeskTheme {
    header: Style::new().bold().underlined(),
    id: Style::new().yellow(),
    muted: Style::new().color256(246).italic(),
    column_title: Style::new().cyan().bold(),
    card_title: Style::new().bold(),
    unassigned: Style::new().red().bold(),
});
