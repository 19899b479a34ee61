/// Pack metadata and the data paths derived from it.
///
/// Properties are queried via methods so gate and path rules live here,
/// not in the catalog loader or the progression rules.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Category {
    Standard,
    Event,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pack {
    pub id: String,
    /// Display name, also the directory name of the pack's data.
    pub name: String,
    pub description: Option<String>,
    pub cover: usize,
    /// Number of levels, always > 0.
    pub lvls: usize,
    /// Stars needed to open the pack. `None` = ungated.
    pub star: Option<u32>,
    /// First completion of each level awards a star.
    pub is_star_eligible: bool,
    pub category: Category,
}

impl Pack {
    /// Is the star gate open for a player holding `stars`?
    pub fn gate_open(&self, stars: u32) -> bool {
        self.star.map_or(true, |cost| stars >= cost)
    }

    /// Directory holding the pack's word list and images, relative to the data root.
    pub fn data_dir(&self) -> String {
        match self.category {
            Category::Standard => self.name.clone(),
            Category::Event => format!("Events/{}", self.name),
        }
    }

    pub fn words_path(&self) -> String {
        format!("{}/units.json", self.data_dir())
    }

    /// Cover image of a level. Images are numbered from 1.
    pub fn image_path(&self, level: usize) -> String {
        format!("{}/img/{}.webp", self.data_dir(), level + 1)
    }

    pub fn has_level(&self, level: usize) -> bool {
        level < self.lvls
    }
}

#[cfg(test)]
pub fn test_pack(id: &str, lvls: usize) -> Pack {
    Pack {
        id: id.to_string(),
        name: id.to_string(),
        description: None,
        cover: 0,
        lvls,
        star: None,
        is_star_eligible: false,
        category: Category::Standard,
    }
}
