// Slippy-map tile addressing

const SUBDOMAINS: [&str; 3] = ["a", "b", "c"];
const TILE_HOST: &str = "tile.openstreetmap.org";

/// Build the URL for a map tile.
///
/// Load is spread across the three public subdomains with a simple hash of
/// the tile coordinates, so the same tile always resolves to the same host.
pub fn tile_url(z: u32, x: u32, y: u32) -> String {
    let subdomain = SUBDOMAINS[((x + y + z) % 3) as usize];
    format!("https://{}.{}/{}/{}/{}.png", subdomain, TILE_HOST, z, x, y)
}
