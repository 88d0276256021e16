use std::thread;

use pretty_assertions::assert_eq;
use sns_reactions_engine::{
    FeedService, GenerationMode, JsonFileStore, MemoryStore, MessageStore, PageSet, Platform,
    RawText, StoreError,
};
use tempfile::TempDir;

fn response(username: &str) -> String {
    format!("Story text.\n[POST]\nUser: {username}\nContent: hello\nStats: 1\n[/POST]\nMore story.")
}

#[test]
fn concurrent_appends_are_not_lost() {
    let service = FeedService::new(MemoryStore::new());
    let writers = 8;
    let per_writer = 5;

    thread::scope(|scope| {
        for w in 0..writers {
            let service = &service;
            scope.spawn(move || {
                for i in 0..per_writer {
                    service
                        .update("msg", |pages| {
                            pages.apply_generation(
                                &response(&format!("@w{w}_{i}")),
                                Platform::Twitter,
                                GenerationMode::Append,
                            )
                        })
                        .unwrap();
                }
            });
        }
    });

    let pages = service.load("msg").unwrap();
    assert_eq!(pages.len(), writers * per_writer);
    assert_eq!(pages.page_index(), pages.len() - 1);
}

#[test]
fn generate_edit_delete_flow_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    let service = FeedService::new(JsonFileStore::new(&path));

    {
        let guard = service.begin_generation("42").unwrap();
        assert!(matches!(
            service.begin_generation("42"),
            Err(StoreError::GenerationInFlight(_))
        ));
        let count = service
            .apply_generation(&guard, &response("@first"), Platform::Youtube, GenerationMode::Append)
            .unwrap();
        assert_eq!(count, 1);
    }

    let guard = service.begin_generation("42").unwrap();
    service
        .apply_generation(&guard, &response("@second"), Platform::Youtube, GenerationMode::Append)
        .unwrap();
    drop(guard);

    assert_eq!(
        service.editable_text("42").unwrap().as_deref(),
        Some("[POST]\nUser: @second\nContent: hello\nStats: 1\n[/POST]")
    );

    service
        .save_edit("42", "[POST]\nUser: @edited\nContent: better\n[/POST]")
        .unwrap();
    service.select_page("42", 0).unwrap();

    // A fresh store over the same file sees every change.
    let reopened = JsonFileStore::new(&path);
    let pages: PageSet = reopened.load("42").unwrap().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages.page_index(), 0);
    assert_eq!(pages.platform(), Some(Platform::Youtube));
    assert_eq!(pages.page(1).unwrap()[0].username, "@edited");
    assert!(matches!(pages.raw_text_for(1), Some(RawText::Stored(_))));

    service.delete_page("42", 0).unwrap();
    service.delete_page("42", 0).unwrap();
    let pages = service.load("42").unwrap();
    assert!(pages.is_empty());
    assert_eq!(pages.page_index(), 0);
    assert!(matches!(
        service.delete_page("42", 0),
        Err(StoreError::PageOutOfRange { index: 0, len: 0 })
    ));
}

#[test]
fn generation_that_parses_nothing_leaves_store_untouched() {
    let service = FeedService::new(MemoryStore::new());
    let guard = service.begin_generation("1").unwrap();
    let err = service
        .apply_generation(&guard, "Sorry, no posts today.", Platform::Twitter, GenerationMode::Append)
        .unwrap_err();
    assert!(matches!(err, StoreError::Parse(_)));
    assert_eq!(service.store().load("1").unwrap(), None);
}
