// tests/sprite_helpers.rs

use sitepipe::errors::TaskError;
use std::path::Path;

use sitepipe::tasks::sprites::{icon_name, relative_url, render_stacked_svg, render_symbol_sheet, SvgIcon};

#[test]
fn relative_url_walks_up_from_the_stylesheet() {
    assert_eq!(
        relative_url("assets/styles", "assets/images/icons/sprite.svg"),
        "../images/icons/sprite.svg"
    );
    assert_eq!(relative_url("", "assets/sprite.svg"), "assets/sprite.svg");
    assert_eq!(relative_url("css", "css/sprite.svg"), "sprite.svg");
    assert_eq!(relative_url("a/b/c", "x.svg"), "../../../x.svg");
}

#[test]
fn icon_size_comes_from_width_and_height() {
    let icon = SvgIcon::parse(
        "home",
        r#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" width="16px" height="12"><path d="M0 0h1"/></svg>"#,
    )
    .unwrap();

    assert_eq!(icon.name, "home");
    assert_eq!((icon.width, icon.height), (16.0, 12.0));
    assert_eq!(icon.view_box, "0 0 16 12");
    assert_eq!(icon.body, r#"<path d="M0 0h1"/>"#);
}

#[test]
fn icon_size_falls_back_to_view_box() {
    let icon = SvgIcon::parse(
        "search",
        r#"<svg viewBox="0 0 24 20" xmlns="http://www.w3.org/2000/svg"><circle r="3"/></svg>"#,
    )
    .unwrap();

    assert_eq!((icon.width, icon.height), (24.0, 20.0));
    assert_eq!(icon.view_box, "0 0 24 20");
}

#[test]
fn icon_without_dimensions_is_an_input_error() {
    let err = SvgIcon::parse("bad", "<svg><g/></svg>").unwrap_err();
    assert!(matches!(err, TaskError::Input { ref path, .. } if path == "bad"));

    let err = SvgIcon::parse("not-svg", "<html></html>").unwrap_err();
    assert!(err.is_input_error());
}

#[test]
fn stacked_sprite_offsets_accumulate_heights() {
    let a = SvgIcon::parse("a", r#"<svg width="10" height="10"></svg>"#).unwrap();
    let b = SvgIcon::parse("b", r#"<svg width="20" height="5"></svg>"#).unwrap();
    let c = SvgIcon::parse("c", r#"<svg width="8" height="8"></svg>"#).unwrap();

    let (svg, offsets) = render_stacked_svg(&[a, b, c]);

    assert_eq!(offsets, vec![0.0, 10.0, 15.0]);
    assert!(svg.contains(r#"width="20" height="23""#));
    assert!(svg.contains(r#"id="c""#));
}

#[test]
fn symbol_sheet_prefixes_ids() {
    let icon = SvgIcon::parse("star", r#"<svg viewBox="0 0 4 4"><path/></svg>"#).unwrap();
    let sheet = render_symbol_sheet(&[icon], "i-");

    assert!(sheet.contains(r#"<symbol id="i-star" viewBox="0 0 4 4"><path/></symbol>"#));
}

#[test]
fn icon_names_are_limited_to_id_safe_characters() {
    assert_eq!(icon_name(Path::new("icons/arrow-left_2.svg")).unwrap(), "arrow-left_2");

    for bad in ["icons/a&b.svg", "icons/say\"hi\".png", "icons/two words.svg", "icons/.svg"] {
        let err = icon_name(Path::new(bad)).unwrap_err();
        assert!(err.is_input_error(), "{bad} should be rejected");
    }
}
