mod support;

use folio::application::editor::EditorBuffer;
use folio::application::posts::{CreatePostCommand, PostError};
use folio::application::render::{ComrakRenderer, render_content};
use folio::application::store::from_document;
use folio::domain::posts::{PostDraft, PostMeta, PostSource};
use folio::domain::types::View;
use time::Duration;

use support::{START, create_command, draft, harness, view};

async fn stored_meta(store: &support::FlakyStore, slug: &str) -> PostMeta {
    from_document(view(store, View::Meta, slug).await.expect("meta present")).expect("meta decodes")
}

#[tokio::test]
async fn public_create_is_published_at_creation_time() {
    let h = harness();

    h.service
        .create_post(create_command("launch-notes", true))
        .await
        .expect("created");

    let meta = stored_meta(&h.store, "launch-notes").await;
    assert!(meta.is_public);
    assert!(meta.is_published);
    assert_eq!(meta.published_date, Some(START));
    assert_eq!(meta.last_updated, START);

    let counter = view(&h.store, View::Counter, "launch-notes")
        .await
        .expect("counter present");
    assert_eq!(counter["readCount"], 0);
}

#[tokio::test]
async fn visibility_scenario_keeps_the_publication_latch() {
    let h = harness();
    h.service
        .create_post(create_command("hello-world", false))
        .await
        .expect("created");

    let meta = stored_meta(&h.store, "hello-world").await;
    assert!(!meta.is_published);
    assert_eq!(meta.published_date, None);

    h.clock.advance(Duration::days(1));
    h.service
        .set_visibility("hello-world", true)
        .await
        .expect("published");
    let meta = stored_meta(&h.store, "hello-world").await;
    let published_at = START + Duration::days(1);
    assert!(meta.is_public && meta.is_published);
    assert_eq!(meta.published_date, Some(published_at));

    h.clock.advance(Duration::days(1));
    h.service
        .set_visibility("hello-world", false)
        .await
        .expect("hidden");
    let meta = stored_meta(&h.store, "hello-world").await;
    assert!(!meta.is_public);
    assert!(meta.is_published);
    assert_eq!(meta.published_date, Some(published_at));

    // Editing a hidden, published post keeps its history too.
    h.clock.advance(Duration::days(1));
    h.service
        .edit_post("hello-world", draft("Hello World", false))
        .await
        .expect("edited");
    let meta = stored_meta(&h.store, "hello-world").await;
    assert!(meta.is_published);
    assert_eq!(meta.published_date, Some(published_at));
}

#[tokio::test]
async fn edit_round_trips_every_content_view() {
    let h = harness();
    h.service
        .create_post(create_command("round-trip", false))
        .await
        .expect("created");

    let edited = PostDraft {
        title: "Round Trip, Revised".into(),
        author: "Another Author".into(),
        featured_image: None,
        mdx_source: "## Revised\n\nWith a [link](https://example.com).\n".into(),
        requested_public: true,
    };
    h.clock.advance(Duration::minutes(10));
    h.service
        .edit_post("round-trip", edited.clone())
        .await
        .expect("edited");

    let meta = stored_meta(&h.store, "round-trip").await;
    assert_eq!(meta.slug, "round-trip");
    assert_eq!(meta.title, edited.title);
    assert_eq!(meta.author, edited.author);
    assert_eq!(meta.featured_image, None);
    assert!(meta.is_public);
    assert_eq!(meta.last_updated, START + Duration::minutes(10));

    let source: PostSource =
        from_document(view(&h.store, View::Source, "round-trip").await.expect("source"))
            .expect("source decodes");
    assert_eq!(source.mdx_source, edited.mdx_source);

    let rendered = view(&h.store, View::Rendered, "round-trip")
        .await
        .expect("rendered");
    let expected = render_content(&ComrakRenderer::new(), &edited.mdx_source).expect("renders");
    assert_eq!(rendered["renderedContent"], expected.as_str());
    assert!(!expected.contains('\n'));
}

#[tokio::test]
async fn slug_is_derived_from_the_title_and_never_changes() {
    let h = harness();
    let meta = h
        .service
        .create_post(CreatePostCommand {
            slug: None,
            draft: draft("Baseline Alignment in CSS!", false),
        })
        .await
        .expect("created");
    assert_eq!(meta.slug, "baseline-alignment-in-css");

    let edited = h
        .service
        .edit_post(&meta.slug, draft("A Completely New Title", false))
        .await
        .expect("edited");
    assert_eq!(edited.slug, "baseline-alignment-in-css");
    assert!(
        view(&h.store, View::Meta, "a-completely-new-title")
            .await
            .is_none()
    );
}

#[tokio::test]
async fn delete_twice_reports_not_found_the_second_time() {
    let h = harness();
    h.service
        .create_post(create_command("short-lived", true))
        .await
        .expect("created");

    h.service.delete_post("short-lived").await.expect("deleted");
    for v in View::ALL {
        assert!(view(&h.store, v, "short-lived").await.is_none());
    }

    let err = h
        .service
        .delete_post("short-lived")
        .await
        .expect_err("second delete");
    assert!(matches!(err, PostError::NotFound { .. }));
    assert_eq!(err.user_message(), "Post not found");
}

#[tokio::test]
async fn duplicate_create_is_rejected_without_touching_the_existing_post() {
    let h = harness();
    h.service
        .create_post(create_command("taken", false))
        .await
        .expect("created");

    let err = h
        .service
        .create_post(create_command("taken", true))
        .await
        .expect_err("duplicate");
    assert!(matches!(err, PostError::AlreadyExists { .. }));

    let meta = stored_meta(&h.store, "taken").await;
    assert!(!meta.is_public);
}

#[tokio::test]
async fn load_post_fills_the_editor_buffer() {
    let h = harness();
    h.service
        .create_post(create_command("editable", false))
        .await
        .expect("created");

    let buffer = EditorBuffer::default();
    let mut live = buffer.subscribe();

    let state = h.service.load_post("editable").await.expect("loaded");
    buffer.set(state.mdx_source.clone());

    assert!(live.is_stale());
    assert_eq!(live.sync(), state.mdx_source);

    buffer.edit(|text| text.push_str("\nOne more line.\n"));
    let mut resubmitted = state.to_draft();
    resubmitted.mdx_source = buffer.get();
    h.service
        .edit_post("editable", resubmitted)
        .await
        .expect("edited");

    let reloaded = h.service.load_post("editable").await.expect("reloaded");
    assert!(reloaded.mdx_source.ends_with("One more line.\n"));

    let err = h
        .service
        .load_post("missing")
        .await
        .expect_err("missing post");
    assert!(matches!(err, PostError::NotFound { .. }));
}

#[tokio::test]
async fn invalid_featured_image_fails_validation_before_any_write() {
    let h = harness();
    let mut command = create_command("bad-image", false);
    command.draft.featured_image = Some("cover.png".into());

    let err = h
        .service
        .create_post(command)
        .await
        .expect_err("invalid image");
    assert!(matches!(
        err,
        PostError::ValidationFailed {
            field: "featured_image",
            ..
        }
    ));
    for v in View::ALL {
        assert!(view(&h.store, v, "bad-image").await.is_none());
    }
}
