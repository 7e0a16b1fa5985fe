//! Guest usernames.

use rand::seq::SliceRandom;

const ADJECTIVES: &[&str] = &[
    "Agile", "Bold", "Brave", "Calm", "Clever", "Cosmic", "Crafty", "Daring", "Eager", "Fearless",
    "Fierce", "Gentle", "Grand", "Happy", "Humble", "Jolly", "Keen", "Lively", "Lucky", "Mighty",
    "Nimble", "Noble", "Patient", "Quick", "Quiet", "Rapid", "Sly", "Steady", "Swift", "Tactical",
    "Valiant", "Wise", "Witty", "Zealous",
];

const ANIMALS: &[&str] = &[
    "Badger", "Bear", "Beaver", "Bison", "Cheetah", "Crane", "Dolphin", "Eagle", "Falcon", "Ferret",
    "Fox", "Gazelle", "Hawk", "Heron", "Ibex", "Jaguar", "Koala", "Lemur", "Lynx", "Marmot",
    "Moose", "Narwhal", "Otter", "Owl", "Panda", "Panther", "Puffin", "Raven", "Seal", "Tiger",
    "Walrus", "Wolf", "Yak", "Zebra",
];

/// An adjective-animal pair such as `"NimbleOtter"`.
pub fn random_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Anonymous");
    let animal = ANIMALS.choose(&mut rng).copied().unwrap_or("Player");
    format!("{adjective}{animal}")
}
