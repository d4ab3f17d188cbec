use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use crate::article::Article;
use crate::cache::context::ContextTag;

/// Articles per page, for every list endpoint.
pub const PAGE_SIZE: u32 = 10;

/// Read-only summary of a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionState {
    pub len: usize,
    pub page: u32,
    pub total_pages: u32,
    pub stale: bool,
}

/// Cached articles of one context, in server order, plus its paging state.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    articles: Vec<Article>,
    index: HashMap<String, usize>,
    page: u32,
    total_pages: u32,
    stale: bool,
    epoch: u64,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn get(&self, slug: &str) -> Option<&Article> {
        self.index.get(slug).map(|&i| &self.articles[i])
    }

    pub fn get_mut(&mut self, slug: &str) -> Option<&mut Article> {
        self.index.get(slug).map(|&i| &mut self.articles[i])
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.index.contains_key(slug)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Bumped whenever the partition's target changes under an in-flight fetch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn needs_fetch(&self) -> bool {
        self.stale || self.is_empty()
    }

    pub fn state(&self) -> PartitionState {
        PartitionState {
            len: self.len(),
            page: self.page,
            total_pages: self.total_pages,
            stale: self.stale,
        }
    }

    /// Inserts or overwrites by slug. An overwritten article keeps its position.
    pub fn upsert(&mut self, article: Article) {
        match self.index.get(&article.slug) {
            Some(&i) => self.articles[i] = article,
            None => {
                self.index.insert(article.slug.clone(), self.articles.len());
                self.articles.push(article);
            }
        }
    }

    pub fn replace_all(&mut self, articles: Vec<Article>, total_count: u64) {
        self.articles.clear();
        self.index.clear();
        for article in articles {
            self.upsert(article);
        }
        self.total_pages = total_pages(total_count);
        self.stale = false;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page;
        self.invalidate();
    }

    /// Forces a refetch on the next load and supersedes any in-flight fetch.
    pub fn invalidate(&mut self) {
        self.stale = true;
        self.epoch += 1;
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn clear(&mut self) {
        self.articles.clear();
        self.index.clear();
        self.page = 0;
        self.total_pages = 0;
        self.epoch += 1;
    }
}

fn total_pages(total_count: u64) -> u32 {
    u32::try_from(total_count.div_ceil(u64::from(PAGE_SIZE))).unwrap_or(u32::MAX)
}

/// One partition per [`ContextTag`].
#[derive(Debug, Clone, Default)]
pub struct PartitionRegistry {
    partitions: [Partition; 5],
}

impl Index<ContextTag> for PartitionRegistry {
    type Output = Partition;

    fn index(&self, context: ContextTag) -> &Partition {
        &self.partitions[context.index()]
    }
}

impl IndexMut<ContextTag> for PartitionRegistry {
    fn index_mut(&mut self, context: ContextTag) -> &mut Partition {
        &mut self.partitions[context.index()]
    }
}

impl PartitionRegistry {
    pub fn get(&self, slug: &str, context: ContextTag) -> Option<&Article> {
        self[context].get(slug)
    }

    /// Every cached copy of `slug`, in [`ContextTag::ALL`] order.
    pub fn get_across_all(&self, slug: &str) -> Vec<Article> {
        ContextTag::ALL
            .iter()
            .filter_map(|&context| self[context].get(slug).cloned())
            .collect()
    }

    pub fn holders(&self, slug: &str) -> Vec<ContextTag> {
        ContextTag::ALL
            .into_iter()
            .filter(|&context| self[context].contains(slug))
            .collect()
    }

    pub fn replace_all(&mut self, context: ContextTag, articles: Vec<Article>, total_count: u64) {
        self[context].replace_all(articles, total_count);
    }

    pub fn set_page(&mut self, context: ContextTag, page: u32) {
        self[context].set_page(page);
    }

    pub fn clear_all(&mut self) {
        self.partitions.iter_mut().for_each(Partition::clear);
    }

    /// Overwrites the copy in every partition that already holds the article.
    /// Returns the partitions that were touched.
    pub fn propagate_update(&mut self, article: &Article) -> Vec<ContextTag> {
        let holders = self.holders(&article.slug);
        for &context in &holders {
            self[context].upsert(article.clone());
        }
        holders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Profile;
    use pretty_assertions::assert_eq;

    fn article(slug: &str) -> Article {
        Article::new(slug, slug.to_uppercase(), Profile::new("jake"))
    }

    fn slugs(partition: &Partition) -> Vec<&str> {
        partition.articles().iter().map(|a| a.slug.as_str()).collect()
    }

    #[test]
    fn test_new_partitions_need_fetch() {
        let registry = PartitionRegistry::default();
        for context in ContextTag::ALL {
            assert!(registry[context].needs_fetch());
            assert_eq!(
                registry[context].state(),
                PartitionState { len: 0, page: 0, total_pages: 0, stale: false }
            );
        }
    }

    #[test]
    fn test_replace_all_keeps_order_and_computes_pages() {
        let mut registry = PartitionRegistry::default();
        registry.set_page(ContextTag::Tag, 2);
        registry.replace_all(ContextTag::Tag, vec![article("b"), article("a"), article("c")], 23);

        let tag = &registry[ContextTag::Tag];
        assert_eq!(slugs(tag), vec!["b", "a", "c"]);
        assert_eq!(tag.state(), PartitionState { len: 3, page: 2, total_pages: 3, stale: false });
        assert!(!tag.needs_fetch());

        registry.replace_all(ContextTag::Tag, vec![article("d")], 10);
        assert_eq!(slugs(&registry[ContextTag::Tag]), vec!["d"]);
        assert_eq!(registry[ContextTag::Tag].total_pages(), 1);
        assert!(registry.get("b", ContextTag::Tag).is_none());
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
        assert_eq!(total_pages(23), 3);
    }

    #[test]
    fn test_duplicate_slug_keeps_first_position() {
        let mut partition = Partition::default();
        let mut newer = article("a");
        newer.title = "newer".to_string();
        partition.replace_all(vec![article("a"), article("b"), newer], 3);

        assert_eq!(slugs(&partition), vec!["a", "b"]);
        assert_eq!(partition.get("a").unwrap().title, "newer");
    }

    #[test]
    fn test_set_page_marks_stale() {
        let mut registry = PartitionRegistry::default();
        registry.replace_all(ContextTag::Default, vec![article("a")], 1);
        let epoch = registry[ContextTag::Default].epoch();

        registry.set_page(ContextTag::Default, 1);

        let partition = &registry[ContextTag::Default];
        assert!(partition.is_stale());
        assert!(partition.needs_fetch());
        assert_eq!(partition.page(), 1);
        assert!(partition.epoch() > epoch);
        assert_eq!(partition.len(), 1);
    }

    #[test]
    fn test_get_across_all_follows_context_order() {
        let mut registry = PartitionRegistry::default();
        registry.replace_all(ContextTag::Author, vec![article("a").with_favorites(true, 5)], 1);
        registry.replace_all(ContextTag::Default, vec![article("a"), article("b")], 2);
        registry.replace_all(ContextTag::Tag, vec![article("b")], 1);

        let copies = registry.get_across_all("a");
        assert_eq!(copies.len(), 2);
        assert!(!copies[0].favorited);
        assert!(copies[1].favorited);
        assert_eq!(registry.holders("a"), vec![ContextTag::Default, ContextTag::Author]);
        assert!(registry.get_across_all("zzz").is_empty());
    }

    #[test]
    fn test_clear_all_resets_everything() {
        let mut registry = PartitionRegistry::default();
        for context in ContextTag::ALL {
            registry.set_page(context, 4);
            registry.replace_all(context, vec![article("a")], 42);
        }

        registry.clear_all();

        for context in ContextTag::ALL {
            let state = registry[context].state();
            assert_eq!((state.len, state.page, state.total_pages), (0, 0, 0));
            assert!(registry[context].needs_fetch());
        }
    }

    #[test]
    fn test_propagate_update_only_touches_holders() {
        let mut registry = PartitionRegistry::default();
        registry.replace_all(ContextTag::Default, vec![article("a"), article("b")], 2);
        registry.replace_all(ContextTag::MyFeed, vec![article("a")], 1);
        registry.replace_all(ContextTag::Tag, vec![article("b")], 1);

        let mut edited = article("a");
        edited.body = "edited".to_string();
        let touched = registry.propagate_update(&edited);

        assert_eq!(touched, vec![ContextTag::Default, ContextTag::MyFeed]);
        assert_eq!(registry.get("a", ContextTag::Default).unwrap().body, "edited");
        assert_eq!(registry.get("a", ContextTag::MyFeed).unwrap().body, "edited");
        assert!(registry.get("a", ContextTag::Tag).is_none());
        assert_eq!(slugs(&registry[ContextTag::Default]), vec!["a", "b"]);
    }
}
