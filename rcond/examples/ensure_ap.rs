use rcond::{ConnectionSpec, NetworkManager};
use uuid::Uuid;

#[tokio::main]
async fn main() -> rcond::Result<()> {
    let nm = NetworkManager::new();

    let spec = ConnectionSpec::access_point(Uuid::new_v4(), "rcond-demo", "raspberry", false);
    let path = nm.ensure_connection(&spec).await?;
    println!("Profile {} stored at {}", spec.uuid, path.as_str());

    // A second call finds the same profile.
    let again = nm.ensure_connection(&spec).await?;
    assert_eq!(path, again);

    nm.up("wlan0", &spec.uuid).await?;
    println!("Access point is up on wlan0");

    nm.down("wlan0").await?;
    nm.remove(&spec.uuid).await?;
    Ok(())
}
