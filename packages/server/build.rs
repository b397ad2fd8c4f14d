use std::env;
use std::path::PathBuf;

use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, OneofDescriptorProto, ServiceDescriptorProto,
};
use tonic_build::manual::{Builder, Method, Service};

// Message types live in src/server/grpc/proto.rs as prost-derived structs, so
// the service stubs are generated without protoc.
const PROTO_MODULE: &str = "crate::server::grpc::proto";

const PACKAGE: &str = "providers.v1";

/// (Rust method, RPC name, request message, response message)
const RPCS: [(&str, &str, &str, &str); 4] = [
    (
        "create_provider",
        "CreateProvider",
        "CreateProviderRequest",
        "CreateProviderResponse",
    ),
    (
        "list_all_providers",
        "ListAllProviders",
        "ListAllProvidersRequest",
        "ListAllProvidersResponse",
    ),
    (
        "update_provider",
        "UpdateProvider",
        "UpdateProviderRequest",
        "UpdateProviderResponse",
    ),
    (
        "delete_provider",
        "DeleteProvider",
        "DeleteProviderRequest",
        "DeleteProviderResponse",
    ),
];

fn unary(name: &str, route_name: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route_name)
        .input_type(format!("{}::{}", PROTO_MODULE, input))
        .output_type(format!("{}::{}", PROTO_MODULE, output))
        .codec_path("tonic::codec::ProstCodec")
        .build()
}

// =============================================================================
// Descriptor set for server reflection. Field numbers must match proto.rs.
// =============================================================================

fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

fn message_field(name: &str, number: i32, type_name: &str, label: Label) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(Type::Message as i32),
        type_name: Some(type_name.to_string()),
        ..Default::default()
    }
}

fn message(name: &str, field: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field,
        ..Default::default()
    }
}

fn timestamp_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("google/protobuf/timestamp.proto".to_string()),
        package: Some("google.protobuf".to_string()),
        message_type: vec![message(
            "Timestamp",
            vec![
                scalar("seconds", 1, Type::Int64),
                scalar("nanos", 2, Type::Int32),
            ],
        )],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

fn providers_file() -> FileDescriptorProto {
    const TIMESTAMP: &str = ".google.protobuf.Timestamp";
    let provider_ref = format!(".{}.Provider", PACKAGE);

    // proto3 `optional string name = 2;` is a synthetic oneof.
    let mut update_name = scalar("name", 2, Type::String);
    update_name.oneof_index = Some(0);
    update_name.proto3_optional = Some(true);
    let mut update_request = message(
        "UpdateProviderRequest",
        vec![scalar("provider_id", 1, Type::String), update_name],
    );
    update_request.oneof_decl = vec![OneofDescriptorProto {
        name: Some("_name".to_string()),
        ..Default::default()
    }];

    let messages = vec![
        message(
            "Provider",
            vec![
                scalar("provider_id", 1, Type::String),
                scalar("name", 2, Type::String),
                message_field("created_at", 3, TIMESTAMP, Label::Optional),
                message_field("updated_at", 4, TIMESTAMP, Label::Optional),
            ],
        ),
        message(
            "CreateProviderRequest",
            vec![
                scalar("provider_id", 1, Type::String),
                scalar("name", 2, Type::String),
            ],
        ),
        message(
            "CreateProviderResponse",
            vec![scalar("provider_id", 1, Type::String)],
        ),
        message("ListAllProvidersRequest", vec![]),
        message(
            "ListAllProvidersResponse",
            vec![message_field("providers", 1, &provider_ref, Label::Repeated)],
        ),
        update_request,
        message(
            "UpdateProviderResponse",
            vec![message_field("provider", 1, &provider_ref, Label::Optional)],
        ),
        message(
            "DeleteProviderRequest",
            vec![scalar("provider_id", 1, Type::String)],
        ),
        message("DeleteProviderResponse", vec![]),
    ];

    let methods = RPCS
        .iter()
        .map(|(_, rpc, input, output)| MethodDescriptorProto {
            name: Some(rpc.to_string()),
            input_type: Some(format!(".{}.{}", PACKAGE, input)),
            output_type: Some(format!(".{}.{}", PACKAGE, output)),
            ..Default::default()
        })
        .collect();

    FileDescriptorProto {
        name: Some("providers/v1/providers.proto".to_string()),
        package: Some(PACKAGE.to_string()),
        dependency: vec!["google/protobuf/timestamp.proto".to_string()],
        message_type: messages,
        service: vec![ServiceDescriptorProto {
            name: Some("ProvidersService".to_string()),
            method: methods,
            ..Default::default()
        }],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=migrations");

    let providers = RPCS
        .iter()
        .fold(
            Service::builder().name("ProvidersService").package(PACKAGE),
            |service, (name, rpc, input, output)| {
                service.method(unary(name, rpc, input, output))
            },
        )
        .build();
    Builder::new().compile(&[providers]);

    let descriptors = FileDescriptorSet {
        file: vec![timestamp_file(), providers_file()],
    };
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    std::fs::write(
        out_dir.join("providers_descriptor.bin"),
        descriptors.encode_to_vec(),
    )?;

    Ok(())
}
