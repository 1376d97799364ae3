use super::*;

#[test]
fn named_resolves_presets() {
    assert_eq!(Theme::named("light"), Theme::light());
    assert_eq!(Theme::named("midnight"), Theme::midnight());
    assert_eq!(Theme::named("dark"), Theme::dark());
}

#[test]
fn unknown_name_falls_back_to_dark() {
    assert_eq!(Theme::named("solarized-ultra"), Theme::dark());
    assert_eq!(Theme::default(), Theme::dark());
}

#[test]
fn unknown_classes_use_plain_color() {
    let t = Theme::dark();
    assert_eq!(t.color_for("not-a-class"), t.plain);
    assert_eq!(t.color_for("title"), t.title);
    assert_ne!(t.color_for("keyword"), t.background);
}

#[test]
fn backgrounds_are_opaque() {
    for t in [Theme::dark(), Theme::light(), Theme::midnight()] {
        assert_eq!(t.background[3], 255);
    }
}
