pub mod grenade;
pub mod volley;

pub use grenade::GrenadeTuning;
pub use volley::VolleyTuning;
