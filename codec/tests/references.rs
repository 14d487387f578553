use objgraph_codec::{
    Asset, Codec, ConverterRegistry, DatabaseSet, EngineType, IssueKind, LiveRef, ObjectHandle,
    Persistable, RuntimeMode, SequentialGenerator, Template, Value,
};

struct Texture;
impl EngineType for Texture {
    const TYPE_NAME: &'static str = "Texture";
}

struct Mesh;
impl EngineType for Mesh {
    const TYPE_NAME: &'static str = "Mesh";
}

struct Prefab;
impl EngineType for Prefab {
    const TYPE_NAME: &'static str = "Prefab";
}

struct Enemy;
impl EngineType for Enemy {
    const TYPE_NAME: &'static str = "Enemy";
}

#[derive(Debug, Default, Persistable)]
#[persist(name = "game::Skin")]
struct Skin {
    pub texture: Asset<Texture>,
    pub mesh: Asset<Mesh>,
    pub spawn: Template<Prefab>,
}

#[derive(Debug, Default, Persistable)]
#[persist(name = "game::Grunt")]
struct Grunt {
    #[persist(identity)]
    pub id: Option<ObjectHandle>,
    pub health: i32,
}

#[derive(Debug, Default, Persistable)]
#[persist(name = "game::Squad")]
struct Squad {
    pub target: LiveRef<Enemy>,
    pub leader: Grunt,
}

fn codec() -> Codec {
    Codec::with_converters(ConverterRegistry::new())
}

fn authoring_databases() -> DatabaseSet {
    let mut databases = DatabaseSet::new();
    databases.assets.add_supported::<Texture>();
    databases.assets.set_generator(SequentialGenerator::default());
    databases.templates.add_supported::<Prefab>();
    databases.templates.set_generator(SequentialGenerator::new("tpl-"));
    databases
}

fn running_databases() -> DatabaseSet {
    let mut databases = DatabaseSet::new();
    databases.live_refs.set_generator(SequentialGenerator::new("live-"));
    databases.set_mode(RuntimeMode::Running);
    databases
}

// ---------------------------------------------------------------------------
// Catalogs
// ---------------------------------------------------------------------------

#[test]
fn asset_handle_becomes_identifier() {
    let codec = codec();
    let mut databases = authoring_databases();
    let texture = ObjectHandle::of::<Texture>(7);
    assert_eq!(databases.assets.try_add(texture).as_deref(), Some("id-1"));
    let prefab = ObjectHandle::of::<Prefab>(3);
    assert_eq!(databases.templates.try_add(prefab).as_deref(), Some("tpl-1"));

    let skin = Skin {
        texture: Asset::new(7),
        mesh: Asset::none(),
        spawn: Template::new(3),
    };
    let saved = codec.serialize(&skin, &mut databases).unwrap();
    assert!(saved.issues.is_empty());
    assert_eq!(
        saved.document.fields.value("texture"),
        Some(&Value::String("id-1".into()))
    );
    assert_eq!(
        saved.document.fields.value("spawn"),
        Some(&Value::String("tpl-1".into()))
    );
    assert!(!saved.document.fields.contains("mesh"));

    let mut restored = Skin {
        mesh: Asset::new(99),
        ..Skin::default()
    };
    let issues = codec
        .deserialize_into(&mut restored, &saved.document, &mut databases)
        .unwrap();
    assert!(issues.is_empty());
    assert_eq!(restored.texture.handle(), Some(texture));
    assert_eq!(restored.spawn.handle(), Some(prefab));
    assert!(!restored.mesh.is_set());
}

#[test]
fn unsupported_catalog_type_is_left_out() {
    let codec = codec();
    let mut databases = authoring_databases();
    let skin = Skin {
        mesh: Asset::new(1),
        ..Skin::default()
    };

    let saved = codec.serialize(&skin, &mut databases).unwrap();
    assert!(!saved.document.fields.contains("mesh"));
    assert_eq!(saved.issues.len(), 1);
    assert_eq!(saved.issues[0].kind, IssueKind::UnsupportedType);
    assert_eq!(saved.issues[0].path, "mesh");
}

#[test]
fn unknown_asset_identifier_keeps_field() {
    let codec = codec();
    let mut databases = authoring_databases();
    let document = {
        let mut skin = objgraph_codec::ObjectData::new("game::Skin");
        skin.fields.set("texture", "id-404".to_owned());
        skin
    };

    let mut restored = Skin {
        texture: Asset::new(5),
        ..Skin::default()
    };
    let issues = codec
        .deserialize_into(&mut restored, &document, &mut databases)
        .unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::UnresolvedReference);
    assert_eq!(restored.texture, Asset::new(5));
}

#[test]
fn catalogs_are_frozen_while_running() {
    let mut databases = authoring_databases();
    databases.set_mode(RuntimeMode::Running);
    assert_eq!(databases.assets.try_add(ObjectHandle::of::<Texture>(1)), None);
    assert!(databases.assets.is_empty());
}

// ---------------------------------------------------------------------------
// Live references
// ---------------------------------------------------------------------------

fn sample_squad() -> Squad {
    Squad {
        target: LiveRef::new(42),
        leader: Grunt {
            id: Some(ObjectHandle::of::<Enemy>(42)),
            health: 60,
        },
    }
}

#[test]
fn forward_live_reference_is_filled_at_flush() {
    let codec = codec();
    let mut databases = running_databases();
    let squad = sample_squad();

    let mut ctx = codec.context(&mut databases);
    ctx.serialize(&squad).unwrap();
    assert_eq!(ctx.pending(), 1);
    assert!(!ctx.document().unwrap().fields.contains("target"));

    assert_eq!(ctx.flush().unwrap(), 1);
    let document = ctx.take_document().unwrap();
    assert_eq!(
        document.fields.value("target"),
        Some(&Value::String("live-1".into()))
    );
    let Some(Value::Object(leader)) = document.fields.value("leader") else {
        panic!("leader should be a nested object");
    };
    assert_eq!(leader.reference.as_ref().unwrap().identifier, "live-1");
    assert_eq!(leader.reference.as_ref().unwrap().type_tag, "Enemy");
}

#[test]
fn live_reference_resolves_against_new_instances() {
    let codec = codec();
    let mut saving = running_databases();
    let saved = codec.serialize(&sample_squad(), &mut saving).unwrap();
    assert!(saved.issues.is_empty());

    // a later session: same graph, new instance ids
    let mut loading = running_databases();
    let mut restored = Squad {
        leader: Grunt {
            id: Some(ObjectHandle::of::<Enemy>(1042)),
            health: 0,
        },
        ..Squad::default()
    };
    let mut ctx = codec.context(&mut loading);
    ctx.deserialize(&mut restored, &saved.document).unwrap();
    assert!(!restored.target.is_set());
    ctx.flush().unwrap();
    assert!(ctx.issues().is_empty());
    drop(ctx);

    assert_eq!(restored.target.handle(), Some(ObjectHandle::of::<Enemy>(1042)));
    assert_eq!(restored.leader.health, 60);
    assert_eq!(
        loading.live_refs.try_get_identifier(&ObjectHandle::of::<Enemy>(1042)),
        Some("live-1")
    );
}

#[test]
fn dangling_live_reference_is_reported() {
    let codec = codec();
    let mut databases = running_databases();
    let squad = Squad {
        target: LiveRef::new(7),
        ..sample_squad()
    };

    let saved = codec.serialize(&squad, &mut databases).unwrap();
    assert!(!saved.document.fields.contains("target"));
    assert_eq!(saved.issues.len(), 1);
    assert_eq!(saved.issues[0].kind, IssueKind::UnresolvedReference);
    assert_eq!(saved.issues[0].path, "target");
}

#[test]
fn live_reference_with_wrong_type_is_rejected() {
    let codec = codec();
    let mut databases = running_databases();
    databases
        .live_refs
        .try_insert("live-9", ObjectHandle::of::<Texture>(9));
    let mut document = objgraph_codec::ObjectData::new("game::Squad");
    document.fields.set("target", "live-9".to_owned());

    let mut restored = Squad::default();
    let issues = codec
        .deserialize_into(&mut restored, &document, &mut databases)
        .unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::TypeMismatch);
    assert!(!restored.target.is_set());
}

#[test]
fn leaving_running_mode_forgets_live_references() {
    let codec = codec();
    let mut databases = running_databases();
    codec.serialize(&sample_squad(), &mut databases).unwrap();
    assert_eq!(databases.live_refs.len(), 1);

    databases.set_mode(RuntimeMode::Authoring);
    assert!(databases.live_refs.is_empty());
}

#[test]
fn second_walk_with_pending_actions_is_refused() {
    let codec = codec();
    let mut databases = running_databases();
    let squad = sample_squad();

    let mut ctx = codec.context(&mut databases);
    ctx.serialize(&squad).unwrap();
    assert!(matches!(
        ctx.serialize(&squad),
        Err(objgraph_codec::CodecError::PendingActions { count: 1 })
    ));
    ctx.flush().unwrap();
    assert!(ctx.serialize(&squad).is_ok());
}
