//! The default catalog driven through the layout engine and store.

use hudkit_layout::{
    LayoutConfig, LayoutSettings, LayoutStore, Measurer, MemoryStorage, MinimapShape, Point,
    ResolveContext, SpeedometerStyle, StatusDesign, Viewport,
};
use hudkit_widgets::catalog::STATUS_ROW_GAP;
use hudkit_widgets::{CatalogMeasurer, default_engine, ids};
use proptest::prelude::*;

fn store() -> LayoutStore<CatalogMeasurer> {
    LayoutStore::new(
        default_engine().expect("catalog builds"),
        CatalogMeasurer::new(Viewport::new(1920.0, 1080.0)),
        MemoryStorage::new(),
        LayoutConfig::default(),
    )
}

fn position(store: &LayoutStore<CatalogMeasurer>, id: &str) -> Point {
    store.widget(id).expect("catalog widget").position
}

#[test]
fn fresh_layout_places_the_status_row_above_the_minimap() {
    let store = store();
    assert_eq!(position(&store, ids::MINIMAP), Point::new(20.0, 840.0));
    assert_eq!(position(&store, ids::HEALTH), Point::new(20.0, 784.0));
    assert_eq!(position(&store, ids::ARMOR), Point::new(74.0, 784.0));
    assert_eq!(position(&store, ids::THIRST), Point::new(182.0, 784.0));
    assert_eq!(position(&store, ids::SPEEDOMETER), Point::new(1720.0, 880.0));
    assert_eq!(position(&store, ids::FUEL), Point::new(1674.0, 940.0));
    assert_eq!(position(&store, ids::MONEY), Point::new(1740.0, 230.0));
    assert_eq!(position(&store, ids::COMPASS), Point::new(810.0, 20.0));
    assert!(!store.widget(ids::VOICE).unwrap().visible);
}

#[test]
fn status_design_change_reflows_the_row() {
    let mut store = store();
    assert!(store.set_status_design(StatusDesign::Bar));
    assert!(!store.is_widget_rendered(ids::HEALTH));

    let report = store.run_auto_relayout().expect("window open");
    let moved: Vec<_> = report.moved.iter().map(|id| id.as_str()).collect();
    assert_eq!(moved, ids::STATUS_METERS);
    assert_eq!(position(&store, ids::HEALTH), Point::new(20.0, 818.0));
    assert_eq!(position(&store, ids::ARMOR), Point::new(186.0, 818.0));
    assert_eq!(position(&store, ids::HUNGER), Point::new(352.0, 818.0));
    assert_eq!(position(&store, ids::THIRST), Point::new(518.0, 818.0));
    assert!(store.is_widget_rendered(ids::HEALTH));
}

#[test]
fn minimap_shape_change_keeps_manual_placements() {
    let mut store = store();
    store
        .update_widget_position(ids::ARMOR, Point::new(600.0, 500.0))
        .unwrap();

    assert!(store.set_minimap_shape(MinimapShape::Rectangle));
    let report = store.run_auto_relayout().unwrap();
    let moved: Vec<_> = report.moved.iter().map(|id| id.as_str()).collect();
    assert_eq!(moved, [ids::MINIMAP, ids::HEALTH, ids::HUNGER, ids::THIRST]);

    assert_eq!(position(&store, ids::MINIMAP), Point::new(20.0, 860.0));
    assert_eq!(position(&store, ids::HEALTH), Point::new(20.0, 804.0));
    assert_eq!(position(&store, ids::ARMOR), Point::new(600.0, 500.0));
    // Still chained to armor's default slot, not its manual position.
    assert_eq!(position(&store, ids::HUNGER), Point::new(128.0, 804.0));
}

#[test]
fn viewport_shrink_clamps_committed_positions() {
    let mut store = store();
    store
        .measurer_mut()
        .set_viewport(Viewport::new(1280.0, 720.0));
    store.clamp_to_viewport();
    assert_eq!(position(&store, ids::SPEEDOMETER), Point::new(1100.0, 540.0));
    assert_eq!(position(&store, ids::CHAT), Point::new(20.0, 20.0));
}

#[test]
fn committed_scale_reaches_the_measurer() {
    let mut store = store();
    assert_eq!(store.update_widget_scale(ids::SPEEDOMETER, 2.0).unwrap(), 2.0);
    let rect = store.widget_rect(ids::SPEEDOMETER).unwrap();
    assert_eq!((rect.width, rect.height), (360.0, 360.0));
    // The grown widget was pulled back on screen.
    assert_eq!(position(&store, ids::SPEEDOMETER), Point::new(1560.0, 720.0));

    let placed = store
        .update_widget_position(ids::SPEEDOMETER, Point::new(5000.0, 5000.0))
        .unwrap();
    assert_eq!(placed, Point::new(1560.0, 720.0));

    store.reset_widget(ids::SPEEDOMETER).unwrap();
    assert_eq!(store.widget_rect(ids::SPEEDOMETER).unwrap().width, 180.0);
    assert_eq!(position(&store, ids::SPEEDOMETER), Point::new(1720.0, 880.0));
}

#[test]
fn persisted_scales_are_measured_on_load() {
    let storage = MemoryStorage::new();
    let mut first = LayoutStore::new(
        default_engine().unwrap(),
        CatalogMeasurer::new(Viewport::new(1920.0, 1080.0)),
        storage.clone(),
        LayoutConfig::default(),
    );
    first.update_widget_scale(ids::CHAT, 0.5).unwrap();

    let mut second = LayoutStore::new(
        default_engine().unwrap(),
        CatalogMeasurer::new(Viewport::new(1920.0, 1080.0)),
        storage,
        LayoutConfig::default(),
    );
    let chat = second.widget_rect(ids::CHAT).unwrap();
    assert_eq!((chat.width, chat.height), (210.0, 120.0));
    // Voice hangs off the scaled chat.
    assert_eq!(
        second.resolve_defaults().position(ids::VOICE),
        Some(Point::new(20.0, 150.0))
    );

    second.reset_layout(false);
    assert_eq!(second.widget_rect(ids::CHAT).unwrap().width, 420.0);
}

const DESIGNS: [StatusDesign; 3] = [StatusDesign::Circle, StatusDesign::Bar, StatusDesign::Minimal];
const SHAPES: [MinimapShape; 3] = [MinimapShape::Square, MinimapShape::Circle, MinimapShape::Rectangle];
const STYLES: [SpeedometerStyle; 2] = [SpeedometerStyle::Analog, SpeedometerStyle::Digital];

proptest! {
    #[test]
    fn defaults_stay_on_screen(
        width in 800u32..=3840,
        height in 600u32..=2160,
        design in 0usize..3,
        shape in 0usize..3,
        style in 0usize..2,
    ) {
        let engine = default_engine().expect("catalog builds");
        let viewport = Viewport::new(f64::from(width), f64::from(height));
        let mut measurer = CatalogMeasurer::new(viewport);
        measurer.apply_settings(&LayoutSettings {
            status_design: DESIGNS[design],
            minimap_shape: SHAPES[shape],
            speedometer_style: STYLES[style],
        });

        let layout = engine.resolve_defaults(&ResolveContext::new(&measurer));
        prop_assert_eq!(layout.len(), engine.descriptors().len());
        for entry in layout.iter() {
            prop_assert!(!entry.fell_back, "{} fell back", entry.id);
            let r = entry.rect;
            prop_assert!(r.x >= 0.0 && r.y >= 0.0, "{} at {:?}", entry.id, r);
            prop_assert!(r.right <= viewport.width && r.bottom <= viewport.height, "{} at {:?}", entry.id, r);
        }

        let minimap = layout.rect(ids::MINIMAP).unwrap();
        let health = layout.rect(ids::HEALTH).unwrap();
        prop_assert_eq!(health.bottom + STATUS_ROW_GAP, minimap.y);
    }
}
