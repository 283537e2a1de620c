use estatemap::{GeoPoint, ListingMap, MapConfig, Marker, MarkerStyle, Point};
use std::sync::Arc;

/// Walks the engine through a listing-browser session without any UI:
/// render the default region, frame a set of listings, focus one, and
/// resolve clicks. Fetches live OpenStreetMap tiles, so it needs network.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("🗺️ estatemap headless demo");
    println!("==========================");

    let map = ListingMap::with_openstreetmap(MapConfig::default());
    println!(
        "✅ Engine ready (default region {:.4}, {:.4} at z{})",
        map.config().default_center.lat,
        map.config().default_center.lng,
        map.config().default_zoom
    );

    let listings = [
        Marker::new(
            1,
            GeoPoint::new(45.7580, 21.2355),
            MarkerStyle::for_listing(true, false),
        ),
        Marker::new(
            2,
            GeoPoint::new(45.7601, 21.2296),
            MarkerStyle::for_listing(true, true),
        ),
        Marker::new(
            3,
            GeoPoint::new(45.7532, 21.2448),
            MarkerStyle::for_listing(false, false),
        ),
    ];

    // Frame every listing at once.
    println!("\n🎯 Framing {} listings:", listings.len());
    let framed = map.render_framed(&listings, 800, 600).await?;
    println!(
        "   Viewport: center {:.4}, {:.4} at z{}",
        framed.frame.viewport.center.lat,
        framed.frame.viewport.center.lng,
        framed.frame.viewport.zoom
    );
    framed.raster.save("framed.png")?;
    println!("   Saved framed.png ({}x{})", framed.raster.width(), framed.raster.height());

    // Click on each listing's screen position and print what comes back.
    println!("\n🖱️ Resolving clicks:");
    for listing in &listings {
        let screen = framed.frame.viewport.geo_to_screen(&listing.position);
        let hits = map.hit_test(screen);
        let report = serde_json::json!({
            "click": { "x": screen.x.round(), "y": screen.y.round() },
            "hits": hits.iter().map(|m| m.id).collect::<Vec<_>>(),
        });
        println!("   {}", report);
    }

    // An empty corner resolves to a location instead.
    if let Some(spot) = map.click_to_geo(Point::new(5.0, 5.0)) {
        println!(
            "   Corner click picks location {:.5}, {:.5}",
            spot.lat, spot.lng
        );
    }

    // Zoom in on a single listing.
    println!("\n🔍 Focusing listing 1:");
    let focused = map.render_focused(&listings[0], 800, 600).await?;
    println!(
        "   Viewport: center {:.4}, {:.4} at z{}",
        focused.frame.viewport.center.lat,
        focused.frame.viewport.center.lng,
        focused.frame.viewport.zoom
    );
    focused.raster.save("focused.png")?;
    println!("   Saved focused.png");

    println!("\n✅ Demo complete");
    Ok(())
}
