use colored::CustomColor;
use std::sync::LazyLock;

pub static TERMINAL_THEME: LazyLock<termbg::Theme> = LazyLock::new(|| {
    termbg::theme(std::time::Duration::from_millis(10)).unwrap_or(termbg::Theme::Dark)
});

pub static HEADER_COLOR: LazyLock<CustomColor> =
    LazyLock::new(|| from_terminal_theme((0, 0, 140), (0, 173, 216)));
pub static GENERAL_TEXT_COLOR: LazyLock<CustomColor> =
    LazyLock::new(|| from_terminal_theme((64, 64, 64), (160, 160, 160)));
pub static ARGUMENT_NAME_COLOR: LazyLock<CustomColor> =
    LazyLock::new(|| from_terminal_theme((112, 127, 35), (187, 142, 35)));
pub static MEMORY_MAP_COLOR: LazyLock<CustomColor> =
    LazyLock::new(|| from_terminal_theme((0, 169, 233), (0, 169, 223)));
pub static NOTICE_COLOR: LazyLock<CustomColor> =
    LazyLock::new(|| from_terminal_theme((82, 138, 174), (47, 86, 54)));
pub static EXCEPTION_COLOR: LazyLock<CustomColor> =
    LazyLock::new(|| from_terminal_theme((250, 160, 160), (100, 0, 0)));

fn from_terminal_theme(
    (light_r, light_g, light_b): (u8, u8, u8),
    (dark_r, dark_g, dark_b): (u8, u8, u8),
) -> CustomColor {
    match *TERMINAL_THEME {
        termbg::Theme::Light => CustomColor::new(light_r, light_g, light_b),
        termbg::Theme::Dark => CustomColor::new(dark_r, dark_g, dark_b),
    }
}
