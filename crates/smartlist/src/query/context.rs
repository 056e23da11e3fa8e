//! Per-item search context.

use crate::types::Item;

use super::expression::SearchField;
use super::text_match::fold_case;

/// Original and case-folded text of one searchable field.
pub struct FieldText {
    original: String,
    folded: String,
    char_len: usize,
}

impl FieldText {
    fn new(original: String) -> Self {
        let folded = fold_case(&original);
        let char_len = original.chars().count();
        Self {
            original,
            folded,
            char_len,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn folded(&self) -> &str {
        &self.folded
    }

    pub fn char_len(&self) -> usize {
        self.char_len
    }
}

/// Query context for item matching.
///
/// Field text is computed once per item so every leaf term of a query
/// reuses the same folded strings.
pub struct ItemQueryContext {
    title: FieldText,
    collection_name: FieldText,
    description: FieldText,
    duration: Option<FieldText>,
    publish_date: Option<FieldText>,
}

impl ItemQueryContext {
    pub fn new(item: &Item) -> Self {
        Self {
            title: FieldText::new(item.title.clone()),
            collection_name: FieldText::new(item.collection_name.clone()),
            description: FieldText::new(item.description.clone()),
            duration: item.formatted_duration().map(FieldText::new),
            publish_date: item.formatted_publish_date().map(FieldText::new),
        }
    }

    /// Returns the text for a field, or `None` when the item lacks it.
    pub fn field(&self, field: SearchField) -> Option<&FieldText> {
        match field {
            SearchField::Title => Some(&self.title),
            SearchField::CollectionName => Some(&self.collection_name),
            SearchField::Description => Some(&self.description),
            SearchField::Duration => self.duration.as_ref(),
            SearchField::PublishDate => self.publish_date.as_ref(),
        }
    }
}
