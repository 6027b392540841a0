use std::collections::HashMap;

use crate::model::StyleId;

use super::xml::XmlElement;

#[derive(Clone, Debug, PartialEq)]
pub struct StyleDef {
    pub name: String,
    pub family: Option<String>,
    /// Row style carrying `fo:break-before="page"`.
    pub page_break_before: bool,
    /// Defined in `office:automatic-styles`, as opposed to only referenced.
    pub automatic: bool,
}

/// Arena of style names. Built while the template is read; afterwards it is
/// only ever borrowed immutably, so cloning blocks cannot add entries.
#[derive(Debug, Default)]
pub struct StyleTable {
    defs: Vec<StyleDef>,
    index: HashMap<String, StyleId>,
}

impl StyleTable {
    /// Collect the automatic styles declared in `content.xml`.
    pub fn from_content(root: &XmlElement) -> Self {
        let mut table = StyleTable::default();
        let Some(styles) = root.child("office:automatic-styles") else {
            return table;
        };
        for style in styles.child_elements().filter(|e| e.name == "style:style") {
            let Some(name) = style.attr("style:name") else {
                continue;
            };
            let page_break_before = style
                .child("style:table-row-properties")
                .and_then(|p| p.attr("fo:break-before"))
                == Some("page");
            let id = table.intern(name);
            let def = &mut table.defs[id.0 as usize];
            def.family = style.attr("style:family").map(str::to_string);
            def.page_break_before = page_break_before;
            def.automatic = true;
        }
        table
    }

    pub(crate) fn intern(&mut self, name: &str) -> StyleId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = StyleId(self.defs.len() as u32);
        self.defs.push(StyleDef {
            name: name.to_string(),
            family: None,
            page_break_before: false,
            automatic: false,
        });
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn get(&self, id: StyleId) -> Option<&StyleDef> {
        self.defs.get(id.0 as usize)
    }

    pub fn name(&self, id: StyleId) -> &str {
        self.get(id).map(|d| d.name.as_str()).unwrap_or("")
    }

    pub fn lookup(&self, name: &str) -> Option<StyleId> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn automatic_count(&self) -> usize {
        self.defs.iter().filter(|d| d.automatic).count()
    }
}
