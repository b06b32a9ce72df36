use crate::models::FoodCategory;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub category: FoodCategory,
    pub localized_name: Option<&'static str>,
}

/// Read-only ingredient tables shared by every classification.
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_name: HashMap<&'static str, usize>,
    problematic: HashSet<&'static str>,
    overrides: HashMap<&'static str, &'static str>,
    excluded: HashSet<&'static str>,
}

static CATALOG: Lazy<Catalog> = Lazy::new(Catalog::builtin);

pub fn catalog() -> &'static Catalog {
    &CATALOG
}

impl Catalog {
    fn builtin() -> Self {
        let localized: HashMap<&'static str, &'static str> =
            LOCALIZED_NAMES.iter().copied().collect();
        let mut entries = Vec::new();
        let mut by_name = HashMap::new();

        for category in FoodCategory::SCAN_ORDER {
            let items = CATEGORY_ITEMS
                .iter()
                .find(|(cat, _)| *cat == category)
                .map(|(_, items)| *items)
                .unwrap_or(&[]);
            for name in items {
                if by_name.contains_key(name) {
                    warn!(target = "pantry.catalog", item = %name, "duplicate_catalog_entry_skipped");
                    continue;
                }
                by_name.insert(*name, entries.len());
                entries.push(CatalogEntry {
                    name: *name,
                    category,
                    localized_name: localized.get(name).copied(),
                });
            }
        }

        Self {
            entries,
            by_name,
            problematic: PROBLEMATIC_ITEMS.iter().copied().collect(),
            overrides: OVERRIDES.iter().copied().collect(),
            excluded: EXCLUDED_TAGS.iter().copied().collect(),
        }
    }

    /// Entries in scan order: categories as listed in [`FoodCategory::SCAN_ORDER`],
    /// items in table order within each category.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.by_name.get(name).map(|idx| &self.entries[*idx])
    }

    pub fn is_problematic(&self, name: &str) -> bool {
        self.problematic.contains(name)
    }

    pub fn is_excluded(&self, tag: &str) -> bool {
        self.excluded.contains(tag)
    }

    pub fn override_for(&self, tag: &str) -> Option<&CatalogEntry> {
        self.overrides.get(tag).and_then(|target| self.get(target))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

const CATEGORY_ITEMS: [(FoodCategory, &[&str]); 8] = [
    (
        FoodCategory::Vegetables,
        &[
            "tomato",
            "onion",
            "green onion",
            "garlic",
            "potato",
            "sweet potato",
            "carrot",
            "pepper",
            "bell pepper",
            "cucumber",
            "lettuce",
            "spinach",
            "cabbage",
            "broccoli",
            "cauliflower",
            "eggplant",
            "zucchini",
            "mushroom",
            "celery",
            "corn",
            "pumpkin",
            "radish",
            "asparagus",
            "kale",
            "leek",
        ],
    ),
    (
        FoodCategory::Fruits,
        &[
            "apple",
            "banana",
            "orange",
            "lemon",
            "lime",
            "strawberry",
            "grape",
            "mango",
            "pineapple",
            "peach",
            "pear",
            "watermelon",
            "cherry",
            "blueberry",
            "avocado",
            "olive",
            "coconut",
            "kiwi",
            "plum",
        ],
    ),
    (
        FoodCategory::Meat,
        &[
            "chicken", "beef", "pork", "lamb", "bacon", "sausage", "turkey", "duck", "ham",
            "shrimp", "salmon", "tuna", "fish",
        ],
    ),
    (
        FoodCategory::Dairy,
        &[
            "cheese",
            "milk",
            "butter",
            "yogurt",
            "cream",
            "egg",
            "mozzarella",
            "parmesan",
        ],
    ),
    (
        FoodCategory::Grains,
        &[
            "rice", "bread", "pasta", "noodle", "flour", "oats", "quinoa", "barley", "tortilla",
            "couscous",
        ],
    ),
    (
        FoodCategory::Legumes,
        &["bean", "chickpea", "lentil", "pea", "tofu", "soybean", "peanut"],
    ),
    (
        FoodCategory::Herbs,
        &[
            "basil", "parsley", "cilantro", "mint", "rosemary", "thyme", "dill", "oregano", "sage",
            "chive",
        ],
    ),
    (
        FoodCategory::Spices,
        &[
            "ginger",
            "chili",
            "cinnamon",
            "cumin",
            "paprika",
            "turmeric",
            "black pepper",
            "nutmeg",
            "clove",
            "star anise",
            "saffron",
            "vanilla",
        ],
    ),
];

const LOCALIZED_NAMES: &[(&str, &str)] = &[
    ("tomato", "番茄"),
    ("onion", "洋葱"),
    ("green onion", "葱"),
    ("garlic", "大蒜"),
    ("potato", "土豆"),
    ("sweet potato", "红薯"),
    ("carrot", "胡萝卜"),
    ("pepper", "辣椒"),
    ("bell pepper", "甜椒"),
    ("cucumber", "黄瓜"),
    ("lettuce", "生菜"),
    ("spinach", "菠菜"),
    ("cabbage", "卷心菜"),
    ("broccoli", "西兰花"),
    ("cauliflower", "花椰菜"),
    ("eggplant", "茄子"),
    ("zucchini", "西葫芦"),
    ("mushroom", "蘑菇"),
    ("celery", "芹菜"),
    ("corn", "玉米"),
    ("pumpkin", "南瓜"),
    ("radish", "萝卜"),
    ("asparagus", "芦笋"),
    ("apple", "苹果"),
    ("banana", "香蕉"),
    ("orange", "橙子"),
    ("lemon", "柠檬"),
    ("lime", "青柠"),
    ("strawberry", "草莓"),
    ("grape", "葡萄"),
    ("mango", "芒果"),
    ("pineapple", "菠萝"),
    ("peach", "桃子"),
    ("pear", "梨"),
    ("watermelon", "西瓜"),
    ("cherry", "樱桃"),
    ("blueberry", "蓝莓"),
    ("avocado", "牛油果"),
    ("coconut", "椰子"),
    ("chicken", "鸡肉"),
    ("beef", "牛肉"),
    ("pork", "猪肉"),
    ("lamb", "羊肉"),
    ("bacon", "培根"),
    ("sausage", "香肠"),
    ("duck", "鸭肉"),
    ("shrimp", "虾"),
    ("salmon", "三文鱼"),
    ("fish", "鱼"),
    ("cheese", "奶酪"),
    ("milk", "牛奶"),
    ("butter", "黄油"),
    ("yogurt", "酸奶"),
    ("egg", "鸡蛋"),
    ("rice", "米饭"),
    ("bread", "面包"),
    ("pasta", "意大利面"),
    ("noodle", "面条"),
    ("flour", "面粉"),
    ("bean", "豆子"),
    ("chickpea", "鹰嘴豆"),
    ("tofu", "豆腐"),
    ("peanut", "花生"),
    ("basil", "罗勒"),
    ("parsley", "欧芹"),
    ("cilantro", "香菜"),
    ("mint", "薄荷"),
    ("ginger", "姜"),
    ("chili", "辣椒粉"),
    ("cinnamon", "肉桂"),
    ("black pepper", "黑胡椒"),
    ("star anise", "八角"),
];

/// Items that double as colour names and show up as false positives.
const PROBLEMATIC_ITEMS: &[&str] = &[
    "orange", "lime", "lemon", "olive", "peach", "plum", "cherry", "salmon", "mint", "cream",
];

const OVERRIDES: &[(&str, &str)] = &[
    ("aubergine", "eggplant"),
    ("courgette", "zucchini"),
    ("capsicum", "bell pepper"),
    ("scallion", "green onion"),
    ("spring onion", "green onion"),
    ("coriander", "cilantro"),
    ("garbanzo", "chickpea"),
    ("prawn", "shrimp"),
    ("prawns", "shrimp"),
    ("chilli", "chili"),
    ("maize", "corn"),
    ("spaghetti", "pasta"),
    ("yoghurt", "yogurt"),
    ("minced meat", "beef"),
    ("bok choy", "cabbage"),
];

/// Generic scene, material, people and container labels that never name an ingredient.
const EXCLUDED_TAGS: &[&str] = &[
    "food",
    "dish",
    "cuisine",
    "meal",
    "recipe",
    "ingredient",
    "produce",
    "vegetable",
    "fruit",
    "natural foods",
    "whole food",
    "staple food",
    "superfood",
    "cooking",
    "baking",
    "plant",
    "background",
    "sky",
    "white",
    "close-up",
    "still life",
    "table",
    "tableware",
    "countertop",
    "kitchen",
    "wood",
    "cutting board",
    "plate",
    "bowl",
    "dishware",
    "cookware",
    "container",
    "jar",
    "bottle",
    "box",
    "bag",
    "person",
    "people",
    "hand",
    "finger",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_are_unique_and_lowercase() {
        let total: usize = CATEGORY_ITEMS.iter().map(|(_, items)| items.len()).sum();
        assert_eq!(catalog().len(), total);
        for entry in catalog().entries() {
            assert_eq!(entry.name, entry.name.trim().to_lowercase());
        }
    }

    #[test]
    fn entries_follow_category_scan_order() {
        let order: Vec<FoodCategory> = catalog().entries().iter().map(|e| e.category).collect();
        let mut positions = order
            .iter()
            .map(|cat| FoodCategory::SCAN_ORDER.iter().position(|c| c == cat).unwrap());
        let mut last = 0;
        assert!(positions.all(|pos| {
            let ok = pos >= last;
            last = pos;
            ok
        }));
        assert_eq!(catalog().entries()[0].name, "tomato");
    }

    #[test]
    fn side_tables_reference_catalog_items() {
        for (alias, target) in OVERRIDES {
            assert!(catalog().get(target).is_some(), "override {alias} -> {target}");
            assert!(catalog().get(alias).is_none(), "alias {alias} shadows an entry");
        }
        for item in PROBLEMATIC_ITEMS {
            assert!(catalog().get(item).is_some(), "problematic {item}");
        }
        for (name, _) in LOCALIZED_NAMES {
            assert!(catalog().get(name).is_some(), "localized {name}");
        }
        for tag in EXCLUDED_TAGS {
            assert!(catalog().get(tag).is_none(), "excluded {tag} is a catalog item");
        }
    }

    #[test]
    fn lookups() {
        let tomato = catalog().get("tomato").expect("tomato");
        assert_eq!(tomato.category, FoodCategory::Vegetables);
        assert_eq!(tomato.localized_name, Some("番茄"));
        assert_eq!(catalog().get("kale").and_then(|e| e.localized_name), None);
        assert_eq!(
            catalog().override_for("aubergine").map(|e| e.name),
            Some("eggplant")
        );
        assert!(catalog().is_problematic("orange"));
        assert!(!catalog().is_problematic("tomato"));
        assert!(catalog().is_excluded("background"));
    }
}
