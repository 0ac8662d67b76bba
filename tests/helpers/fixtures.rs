use metascope::metadata::{ModuleHandle, TypeToken};
use metascope::source::{DomainSnapshot, ModuleSnapshot, Snapshot, TypeSnapshot};
use metascope::{Domain, Field, Method, Module, TypeDefinition, TypeLayout};

pub fn snapshot(modules: Vec<ModuleSnapshot>) -> Snapshot {
    Snapshot {
        domains: vec![DomainSnapshot {
            domain: Domain {
                id: 1,
                name: "Root Domain".to_string(),
            },
            modules,
        }],
    }
}

pub fn module(handle: u64, name: &str, types: Vec<TypeSnapshot>) -> ModuleSnapshot {
    ModuleSnapshot {
        module: Module {
            handle: ModuleHandle(handle),
            base_address: 0x1000_0000 + handle * 0x10_0000,
            name: name.to_string(),
        },
        types,
    }
}

/// A type with the given members. Tokens are unique within `module`.
pub fn type_def(
    module: u64,
    token: u32,
    name: &str,
    methods: &[&str],
    fields: &[&str],
) -> TypeSnapshot {
    let mut definition =
        TypeDefinition::new(ModuleHandle(module), TypeToken(0x0200_0000 + token), name);
    definition.address = 0x7000_0000 + module * 0x1_0000 + token as u64 * 0x100;

    TypeSnapshot {
        methods: methods
            .iter()
            .enumerate()
            .map(|(i, m)| Method::new(0x0600_0000 + token * 0x100 + i as u32, *m))
            .collect(),
        fields: fields
            .iter()
            .enumerate()
            .map(|(i, f)| Field::new(*f, "System.Int32", 0x10 + 4 * i as u32))
            .collect(),
        layout: Some(TypeLayout {
            instance_size: 0x10 + 4 * fields.len() as u32,
            vtable_address: definition.address + 0x80,
        }),
        definition,
    }
}

/// `Game.Core` with `PlayerController { TakeDamage(), health }`
pub fn game_scenario() -> Snapshot {
    snapshot(vec![module(
        1,
        "Game.Core",
        vec![type_def(1, 1, "PlayerController", &["TakeDamage"], &["health"])],
    )])
}

/// Three modules of two types each
pub fn three_modules() -> Snapshot {
    snapshot(vec![
        module(
            1,
            "Game.Core",
            vec![
                type_def(1, 1, "PlayerController", &["TakeDamage", "Heal"], &["health"]),
                type_def(1, 2, "Enemy", &["Attack"], &["damage", "speed"]),
            ],
        ),
        module(
            2,
            "Game.Net",
            vec![
                type_def(2, 1, "NetSession", &["Connect"], &["latency"]),
                type_def(2, 2, "PacketQueue", &["Flush"], &["capacity"]),
            ],
        ),
        module(
            3,
            "Game.UI",
            vec![
                type_def(3, 1, "HealthBar", &["Refresh"], &["fill_amount"]),
                type_def(3, 2, "Minimap", &["Zoom"], &["scale"]),
            ],
        ),
    ])
}

/// Types named `Get`, `GetName` and `WidgetGetter`, inserted in reverse
/// order of their expected rank
pub fn ranking_snapshot() -> Snapshot {
    snapshot(vec![module(
        1,
        "Lib",
        vec![
            type_def(1, 1, "WidgetGetter", &[], &[]),
            type_def(1, 2, "GetName", &[], &[]),
            type_def(1, 3, "Get", &[], &[]),
        ],
    )])
}

/// `modules` modules of `types` types each, all named `{prefix}Type{m}_{t}`
pub fn wide_snapshot(prefix: &str, modules: u64, types: u32) -> Snapshot {
    snapshot(
        (1..=modules)
            .map(|m| {
                module(
                    m,
                    &format!("{}.Module{}", prefix, m),
                    (1..=types)
                        .map(|t| {
                            type_def(
                                m,
                                t,
                                &format!("{}Type{}_{}", prefix, m, t),
                                &["Update"],
                                &["value"],
                            )
                        })
                        .collect(),
                )
            })
            .collect(),
    )
}
