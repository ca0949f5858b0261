//! Curated option lists offered for each free-text config field.
//!
//! These are suggestions only; any string is accepted by the config model.

use crate::config::{ArtStyle, ViewAngle, FREE_FORM_POSE, NO_EFFECTS};

pub const HAIR_STYLES: &[&str] = &[
    "Long straight",
    "Ponytail",
    "Short bob",
    "Wavy curls",
    "Buzz cut",
    "Twin braids",
    "Mohawk",
    "Hair over one eye",
    "High bun",
    "Layered",
    "Mullet",
    "Hime cut",
    "Slicked back",
    "Messy natural",
    "Bald",
    "Dreadlocks",
    "Curtain bangs",
    "Pixie cut",
    "Floor-length",
    "Half-up",
    "Undercut",
    "Odango (double buns)",
    "Blunt bangs",
];

pub const CLOTHING_STYLES: &[&str] = &[
    "Japanese school uniform",
    "Fantasy warrior armor",
    "Cyberpunk outfit",
    "T-shirt and jeans",
    "Glamorous evening gown",
    "Traditional kimono",
    "Sporty athletic wear",
    "Wizard robe",
    "Steampunk outfit",
    "Ninja garb",
    "Gothic Lolita dress",
    "Streetwear hoodie",
    "Maid / butler uniform",
    "Pirate outfit",
    "Astronaut suit",
    "Detective trench coat",
    "Idol stage costume",
    "Mecha pilot suit",
    "Summer swimwear",
    "Vampire noble attire",
    "Doctor's coat",
    "Camo military fatigues",
    "Ancient hanfu",
    "Modern ao dai",
    "Wild west cowboy",
    "Wedding dress",
    "Tailored suit",
    "Viking garb",
];

pub const ACCESSORIES: &[&str] = &[
    NO_EFFECTS,
    "Cat-eye glasses",
    "Gaming headset",
    "Katana on the back",
    "Angel wings",
    "Baseball cap",
    "Choker necklace",
    "Fox mask",
    "Demon wings",
    "Halo",
    "Eyepatch",
    "Neck scarf",
    "Magic staff",
    "Floating spellbook",
    "Knight's shield",
    "Sniper rifle",
    "Hovering drone",
    "Cat ears (nekomimi)",
    "Royal crown",
    "Bandaged arms",
    "Travel backpack",
    "Antique lantern",
    "Electric guitar",
    "Monocle",
    "Cross earrings",
    "Dragon horns",
    "Nine fox tails",
    "Gas mask",
    "VR headset",
    "Chains",
    "Plush toy",
];

pub const POSES: &[&str] = &[
    FREE_FORM_POSE,
    "Standing at attention",
    "Battle stance",
    "Sitting relaxed",
    "Floating in the air",
    "Sprinting",
    "Weapon raised high",
    "Waving hello",
    "Arms crossed",
    "Kneeling on one knee",
    "Jumping for joy",
    "Leaning against a wall",
    "Lying on one side",
    "Sword slash",
    "Drawing a bow",
    "Reading a book",
    "Drinking tea",
    "Heart hands",
    "Looking back over the shoulder",
    "Martial arts guard",
    "V-sign",
];

pub const BACKGROUNDS: &[&str] = &[
    "Plain white background",
    "Futuristic Neo-Tokyo",
    "Enchanted forest",
    "Classroom in the afternoon",
    "Starry sky",
    "Burning battlefield",
    "Cozy cafe",
    "Vast outer space",
    "Sunset beach",
    "Ancient library",
    "Haunted castle",
    "Sunflower field",
    "Rainy street",
    "Science laboratory",
    "School rooftop",
    "Ocean floor",
    "Shinto shrine",
    "Barren desert",
    "Above the clouds",
    "Dark dungeon",
];

pub const EXPRESSIONS: &[&str] = &[
    "Confident smile",
    "Cold",
    "Surprised",
    "Angry",
    "Sad",
    "Playful wink",
    "Intensely focused",
    "Dreamy",
    "Blushing shyly",
    "Smirk",
    "Scared",
    "Crying",
    "Sleepy",
    "Yandere",
    "Poker face",
    "Overjoyed",
    "Teasing tongue out",
];

pub const LIGHTING_STYLES: &[&str] = &[
    "Studio lighting (balanced)",
    "Cinematic",
    "Natural light",
    "Backlight",
    "Dramatic lighting",
    "Neon lighting (cyberpunk)",
    "Soft light (softbox)",
    "High contrast (Rembrandt)",
];

pub const LIGHTING_COLORS: &[&str] = &[
    "Natural (white / soft yellow)",
    "Warm (orange / yellow)",
    "Cold (blue)",
    "Mystic (purple / pink)",
    "Eerie (green)",
    "Sunset (red-orange)",
    "Cyber (neon blue / pink)",
];

pub const SPECIAL_EFFECTS: &[&str] = &[
    NO_EFFECTS,
    "Golden aura",
    "Lightning arcs",
    "Sacred fire",
    "Falling cherry blossoms",
    "Magic sparkles",
    "Dark smoke",
    "Magic circle",
    "Cyberpunk glitch",
    "Matrix rain",
    "Water swirl",
    "Falling feathers",
    "Volcanic ash",
    "Glowing butterflies",
    "Frost aura",
];

/// Option list for a config field, by camelCase or snake_case name.
pub fn options_for(field: &str) -> Option<Vec<&'static str>> {
    let key = field.trim().replace(['_', '-'], "").to_ascii_lowercase();
    let list = match key.as_str() {
        "style" => return Some(ArtStyle::ALL.iter().map(|style| style.id()).collect()),
        "view" => return Some(ViewAngle::ALL.iter().map(|view| view.id()).collect()),
        "hairstyle" => HAIR_STYLES,
        "clothing" => CLOTHING_STYLES,
        "accessories" => ACCESSORIES,
        "pose" => POSES,
        "background" => BACKGROUNDS,
        "expression" => EXPRESSIONS,
        "lightingstyle" => LIGHTING_STYLES,
        "lightingcolor" => LIGHTING_COLORS,
        "effects" => SPECIAL_EFFECTS,
        _ => return None,
    };
    Some(list.to_vec())
}

/// Fields that have a curated option list, in display order.
pub const CATALOG_FIELDS: &[&str] = &[
    "style",
    "view",
    "hairStyle",
    "clothing",
    "accessories",
    "pose",
    "background",
    "expression",
    "lightingStyle",
    "lightingColor",
    "effects",
];
