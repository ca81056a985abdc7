use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tokio::sync::Mutex;
use url::Url;
use uuid::Uuid;

const CAPACITY: usize = 256;
const LIFETIME: Duration = Duration::from_secs(15 * 60);

/// Search candidates recently shown to browsers.
///
/// A picked thumbnail is named by the id handed out here, so only addresses our own image
/// search turned up are ever downloaded on a client's behalf.
pub struct OfferedPictures {
	offered: Mutex<IndexMap<Uuid, (Url, Instant)>>,
	capacity: usize,
	lifetime: Duration,
}

impl Default for OfferedPictures {
	fn default() -> Self {
		Self::new(CAPACITY, LIFETIME)
	}
}

impl OfferedPictures {
	pub fn new(capacity: usize, lifetime: Duration) -> Self {
		Self {
			offered: Mutex::new(IndexMap::with_capacity(capacity)),
			capacity,
			lifetime,
		}
	}

	pub async fn offer(&self, url: Url) -> Uuid {
		let mut offered = self.offered.lock().await;

		offered.retain(|_, (_, at)| at.elapsed() < self.lifetime);
		// Oldest first, insertion order is offer order
		while offered.len() >= self.capacity.max(1) {
			offered.shift_remove_index(0);
		}

		let id = Uuid::new_v4();
		offered.insert(id, (url, Instant::now()));

		id
	}

	/// The address behind `id`, if it was offered and hasn't expired yet
	pub async fn resolve(&self, id: &str) -> Option<Url> {
		let id = Uuid::parse_str(id.trim()).ok()?;

		self.offered
			.lock()
			.await
			.get(&id)
			.filter(|(_, at)| at.elapsed() < self.lifetime)
			.map(|(url, _)| url.clone())
	}
}
