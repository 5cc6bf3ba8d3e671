// platform/windows/d3d11.rs - Direct3D 11 Backend
//
// Device, immediate context, the fixed UI pipeline (shaders, input layout,
// blend/raster/depth/sampler state) and the swap chain of the overlay
// window. The swap chain is created the first time the window reports a
// usable size and resized in place afterwards.

use std::ffi::c_void;
use std::mem;

use log::{debug, info};
use windows::core::{s, Interface, PCSTR};
use windows::Win32::Foundation::{HMODULE, HWND, RECT};
use windows::Win32::Graphics::Direct3D::Fxc::D3DCompile;
use windows::Win32::Graphics::Direct3D::{
    ID3DBlob, D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST, D3D_DRIVER_TYPE_HARDWARE, D3D_FEATURE_LEVEL_10_0,
};
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;

use crate::error::{OverlayError, Result};
use crate::platform::{BufferKind, GpuBackend, ScissorRect, TextureData, TextureFormat, WindowHandle};
use crate::ui::{DrawIdx, DrawVert};

const SURFACE_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;

const VERTEX_SHADER: &str = r#"
cbuffer vertexBuffer : register(b0)
{
    float4x4 ProjectionMatrix;
};
struct VS_INPUT
{
    float2 pos : POSITION;
    float4 col : COLOR0;
    float2 uv  : TEXCOORD0;
};
struct PS_INPUT
{
    float4 pos : SV_POSITION;
    float4 col : COLOR0;
    float2 uv  : TEXCOORD0;
};
PS_INPUT main(VS_INPUT input)
{
    PS_INPUT output;
    output.pos = mul(ProjectionMatrix, float4(input.pos.xy, 0.f, 1.f));
    output.col = input.col;
    output.uv  = input.uv;
    return output;
}
"#;

const PIXEL_SHADER: &str = r#"
struct PS_INPUT
{
    float4 pos : SV_POSITION;
    float4 col : COLOR0;
    float2 uv  : TEXCOORD0;
};
sampler sampler0;
Texture2D texture0;
float4 main(PS_INPUT input) : SV_Target
{
    return input.col * texture0.Sample(sampler0, input.uv);
}
"#;

fn blob_bytes(blob: &ID3DBlob) -> &[u8] {
    unsafe { std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize()) }
}

fn compile_shader(source: &str, target: PCSTR) -> Result<ID3DBlob> {
    let mut code = None;
    let mut errors = None;
    let compiled = unsafe {
        D3DCompile(
            source.as_ptr() as *const c_void,
            source.len(),
            None,
            None,
            None,
            s!("main"),
            target,
            0,
            0,
            &mut code,
            Some(&mut errors),
        )
    };
    if let Err(e) = compiled {
        let details = errors
            .as_ref()
            .map(|blob| String::from_utf8_lossy(blob_bytes(blob)).into_owned())
            .unwrap_or_default();
        return Err(OverlayError::Init(format!("shader compilation failed: {:?} {}", e, details)));
    }
    code.ok_or_else(|| OverlayError::Init("shader compiler produced no bytecode".into()))
}

fn created<T>(object: Option<T>, what: &str) -> Result<T> {
    object.ok_or_else(|| OverlayError::Init(format!("{} was not created", what)))
}

/// Fixed-function state and shaders for UI rendering
struct Pipeline {
    vertex_shader: ID3D11VertexShader,
    input_layout: ID3D11InputLayout,
    pixel_shader: ID3D11PixelShader,
    blend: ID3D11BlendState,
    rasterizer: ID3D11RasterizerState,
    depth_stencil: ID3D11DepthStencilState,
    sampler: ID3D11SamplerState,
}

impl Pipeline {
    fn new(device: &ID3D11Device) -> Result<Self> {
        let vs_blob = compile_shader(VERTEX_SHADER, s!("vs_4_0"))?;
        let ps_blob = compile_shader(PIXEL_SHADER, s!("ps_4_0"))?;

        let layout = [
            D3D11_INPUT_ELEMENT_DESC {
                SemanticName: s!("POSITION"),
                SemanticIndex: 0,
                Format: DXGI_FORMAT_R32G32_FLOAT,
                InputSlot: 0,
                AlignedByteOffset: mem::offset_of!(DrawVert, pos) as u32,
                InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            },
            D3D11_INPUT_ELEMENT_DESC {
                SemanticName: s!("TEXCOORD"),
                SemanticIndex: 0,
                Format: DXGI_FORMAT_R32G32_FLOAT,
                InputSlot: 0,
                AlignedByteOffset: mem::offset_of!(DrawVert, uv) as u32,
                InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            },
            D3D11_INPUT_ELEMENT_DESC {
                SemanticName: s!("COLOR"),
                SemanticIndex: 0,
                Format: DXGI_FORMAT_R8G8B8A8_UNORM,
                InputSlot: 0,
                AlignedByteOffset: mem::offset_of!(DrawVert, col) as u32,
                InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            },
        ];

        let mut blend_desc = D3D11_BLEND_DESC::default();
        blend_desc.RenderTarget[0] = D3D11_RENDER_TARGET_BLEND_DESC {
            BlendEnable: true.into(),
            SrcBlend: D3D11_BLEND_SRC_ALPHA,
            DestBlend: D3D11_BLEND_INV_SRC_ALPHA,
            BlendOp: D3D11_BLEND_OP_ADD,
            SrcBlendAlpha: D3D11_BLEND_ONE,
            DestBlendAlpha: D3D11_BLEND_INV_SRC_ALPHA,
            BlendOpAlpha: D3D11_BLEND_OP_ADD,
            RenderTargetWriteMask: D3D11_COLOR_WRITE_ENABLE_ALL.0 as u8,
        };

        let rasterizer_desc = D3D11_RASTERIZER_DESC {
            FillMode: D3D11_FILL_SOLID,
            CullMode: D3D11_CULL_NONE,
            ScissorEnable: true.into(),
            DepthClipEnable: true.into(),
            ..Default::default()
        };

        let stencil_op = D3D11_DEPTH_STENCILOP_DESC {
            StencilFailOp: D3D11_STENCIL_OP_KEEP,
            StencilDepthFailOp: D3D11_STENCIL_OP_KEEP,
            StencilPassOp: D3D11_STENCIL_OP_KEEP,
            StencilFunc: D3D11_COMPARISON_ALWAYS,
        };
        let depth_desc = D3D11_DEPTH_STENCIL_DESC {
            DepthEnable: false.into(),
            DepthWriteMask: D3D11_DEPTH_WRITE_MASK_ALL,
            DepthFunc: D3D11_COMPARISON_ALWAYS,
            StencilEnable: false.into(),
            FrontFace: stencil_op,
            BackFace: stencil_op,
            ..Default::default()
        };

        let sampler_desc = D3D11_SAMPLER_DESC {
            Filter: D3D11_FILTER_MIN_MAG_MIP_LINEAR,
            AddressU: D3D11_TEXTURE_ADDRESS_WRAP,
            AddressV: D3D11_TEXTURE_ADDRESS_WRAP,
            AddressW: D3D11_TEXTURE_ADDRESS_WRAP,
            ComparisonFunc: D3D11_COMPARISON_ALWAYS,
            ..Default::default()
        };

        let mut vertex_shader = None;
        let mut input_layout = None;
        let mut pixel_shader = None;
        let mut blend = None;
        let mut rasterizer = None;
        let mut depth_stencil = None;
        let mut sampler = None;
        unsafe {
            device.CreateVertexShader(blob_bytes(&vs_blob), None, Some(&mut vertex_shader))?;
            device.CreateInputLayout(&layout, blob_bytes(&vs_blob), Some(&mut input_layout))?;
            device.CreatePixelShader(blob_bytes(&ps_blob), None, Some(&mut pixel_shader))?;
            device.CreateBlendState(&blend_desc, Some(&mut blend))?;
            device.CreateRasterizerState(&rasterizer_desc, Some(&mut rasterizer))?;
            device.CreateDepthStencilState(&depth_desc, Some(&mut depth_stencil))?;
            device.CreateSamplerState(&sampler_desc, Some(&mut sampler))?;
        }

        Ok(Self {
            vertex_shader: created(vertex_shader, "vertex shader")?,
            input_layout: created(input_layout, "input layout")?,
            pixel_shader: created(pixel_shader, "pixel shader")?,
            blend: created(blend, "blend state")?,
            rasterizer: created(rasterizer, "rasterizer state")?,
            depth_stencil: created(depth_stencil, "depth-stencil state")?,
            sampler: created(sampler, "sampler")?,
        })
    }
}

/// Direct3D 11 device and the overlay's swap chain
pub struct D3D11Gpu {
    render_target: Option<ID3D11RenderTargetView>,
    swap_chain: Option<IDXGISwapChain>,
    pipeline: Pipeline,
    context: ID3D11DeviceContext,
    device: ID3D11Device,
}

impl D3D11Gpu {
    /// Hardware device at feature level 10.0 or better
    pub fn new() -> Result<Self> {
        let mut device = None;
        let mut context = None;
        unsafe {
            D3D11CreateDevice(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                HMODULE(std::ptr::null_mut()),
                D3D11_CREATE_DEVICE_FLAG(0),
                Some(&[D3D_FEATURE_LEVEL_10_0]),
                D3D11_SDK_VERSION,
                Some(&mut device),
                None,
                Some(&mut context),
            )?;
        }
        let device = created(device, "D3D11 device")?;
        let context = created(context, "D3D11 device context")?;
        let pipeline = Pipeline::new(&device)?;
        info!("Direct3D 11 device created");

        Ok(Self {
            render_target: None,
            swap_chain: None,
            pipeline,
            context,
            device,
        })
    }

    pub fn device(&self) -> &ID3D11Device {
        &self.device
    }

    fn create_swap_chain(&self, hwnd: HWND, width: u32, height: u32) -> Result<IDXGISwapChain> {
        let desc = DXGI_SWAP_CHAIN_DESC {
            BufferDesc: DXGI_MODE_DESC {
                Width: width,
                Height: height,
                RefreshRate: DXGI_RATIONAL { Numerator: 60, Denominator: 1 },
                Format: SURFACE_FORMAT,
                ..Default::default()
            },
            SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: 1,
            OutputWindow: hwnd,
            Windowed: true.into(),
            SwapEffect: DXGI_SWAP_EFFECT_DISCARD,
            Flags: 0,
        };

        unsafe {
            let dxgi_device = self.device.cast::<IDXGIDevice>()?;
            let adapter = dxgi_device.GetAdapter()?;
            let factory: IDXGIFactory = adapter.GetParent()?;

            let mut swap_chain = None;
            factory.CreateSwapChain(&self.device, &desc, &mut swap_chain).ok()?;
            factory.MakeWindowAssociation(hwnd, DXGI_MWA_NO_WINDOW_CHANGES | DXGI_MWA_NO_ALT_ENTER | DXGI_MWA_NO_PRINT_SCREEN)?;
            created(swap_chain, "swap chain")
        }
    }
}

impl GpuBackend for D3D11Gpu {
    type Buffer = ID3D11Buffer;
    type Texture = ID3D11ShaderResourceView;

    fn create_buffer(&mut self, kind: BufferKind, size_bytes: usize) -> Result<ID3D11Buffer> {
        let bind = match kind {
            BufferKind::Vertex => D3D11_BIND_VERTEX_BUFFER,
            BufferKind::Index => D3D11_BIND_INDEX_BUFFER,
            BufferKind::Constant => D3D11_BIND_CONSTANT_BUFFER,
        };
        let desc = D3D11_BUFFER_DESC {
            ByteWidth: size_bytes as u32,
            Usage: D3D11_USAGE_DYNAMIC,
            BindFlags: bind.0 as u32,
            CPUAccessFlags: D3D11_CPU_ACCESS_WRITE.0 as u32,
            MiscFlags: 0,
            StructureByteStride: 0,
        };
        let mut buffer = None;
        unsafe {
            self.device.CreateBuffer(&desc, None, Some(&mut buffer))?;
        }
        debug!("Created {:?} buffer of {} bytes", kind, size_bytes);
        created(buffer, "buffer")
    }

    fn upload(&mut self, buffer: &ID3D11Buffer, chunks: &[&[u8]]) -> Result<()> {
        let mut desc = D3D11_BUFFER_DESC::default();
        unsafe { buffer.GetDesc(&mut desc) };
        let total: usize = chunks.iter().map(|chunk| chunk.len()).sum();
        if total > desc.ByteWidth as usize {
            return Err(OverlayError::Gpu(format!(
                "upload of {} bytes exceeds buffer of {} bytes",
                total, desc.ByteWidth
            )));
        }

        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        unsafe {
            self.context.Map(buffer, 0, D3D11_MAP_WRITE_DISCARD, 0, Some(&mut mapped))?;
            let mut dst = mapped.pData as *mut u8;
            for chunk in chunks {
                std::ptr::copy_nonoverlapping(chunk.as_ptr(), dst, chunk.len());
                dst = dst.add(chunk.len());
            }
            self.context.Unmap(buffer, 0);
        }
        Ok(())
    }

    fn create_texture(&mut self, data: TextureData<'_>) -> Result<ID3D11ShaderResourceView> {
        let format = match data.format {
            TextureFormat::Rgba8Unorm => DXGI_FORMAT_R8G8B8A8_UNORM,
            TextureFormat::Rgba8UnormSrgb => DXGI_FORMAT_R8G8B8A8_UNORM_SRGB,
        };
        let desc = D3D11_TEXTURE2D_DESC {
            Width: data.width,
            Height: data.height,
            MipLevels: 1,
            ArraySize: 1,
            Format: format,
            SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: D3D11_BIND_SHADER_RESOURCE.0 as u32,
            CPUAccessFlags: 0,
            MiscFlags: 0,
        };
        let initial = D3D11_SUBRESOURCE_DATA {
            pSysMem: data.pixels.as_ptr() as *const c_void,
            SysMemPitch: data.width * 4,
            SysMemSlicePitch: 0,
        };

        let mut texture = None;
        let mut view = None;
        unsafe {
            self.device.CreateTexture2D(&desc, Some(&initial), Some(&mut texture))?;
            let texture = created(texture, "texture")?;
            self.device.CreateShaderResourceView(&texture, None, Some(&mut view))?;
        }
        // The view keeps the texture alive
        created(view, "shader resource view")
    }

    fn resize_surface(&mut self, window: WindowHandle, width: u32, height: u32) -> Result<()> {
        let hwnd = HWND(window.0 as *mut c_void);
        self.render_target = None;

        let swap_chain = match self.swap_chain.take() {
            Some(swap_chain) => {
                unsafe {
                    swap_chain.ResizeBuffers(1, width, height, SURFACE_FORMAT, DXGI_SWAP_CHAIN_FLAG(0))?;
                }
                swap_chain
            }
            None => {
                info!("Creating swap chain {}x{}", width, height);
                self.create_swap_chain(hwnd, width, height)?
            }
        };

        let mut render_target = None;
        unsafe {
            let back_buffer: ID3D11Texture2D = swap_chain.GetBuffer(0)?;
            self.device.CreateRenderTargetView(&back_buffer, None, Some(&mut render_target))?;
        }
        self.render_target = render_target;
        self.swap_chain = Some(swap_chain);
        Ok(())
    }

    fn begin_target(&mut self, clear_color: [f32; 4]) {
        if let Some(render_target) = &self.render_target {
            unsafe {
                self.context.OMSetRenderTargets(Some(&[Some(render_target.clone())]), None);
                self.context.ClearRenderTargetView(render_target, &clear_color);
            }
        }
    }

    fn setup_render_state(
        &mut self,
        display_size: [f32; 2],
        vertices: &ID3D11Buffer,
        indices: &ID3D11Buffer,
        constants: &ID3D11Buffer,
    ) {
        let viewport = D3D11_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: display_size[0],
            Height: display_size[1],
            MinDepth: 0.0,
            MaxDepth: 1.0,
        };
        let stride = mem::size_of::<DrawVert>() as u32;
        let offset = 0u32;
        let index_format = if mem::size_of::<DrawIdx>() == 2 {
            DXGI_FORMAT_R16_UINT
        } else {
            DXGI_FORMAT_R32_UINT
        };
        let pipeline = &self.pipeline;
        let blend_factor = [0.0f32; 4];

        unsafe {
            let context = &self.context;
            context.RSSetViewports(Some(&[viewport]));
            context.IASetInputLayout(&pipeline.input_layout);
            context.IASetVertexBuffers(0, 1, Some(&Some(vertices.clone())), Some(&stride), Some(&offset));
            context.IASetIndexBuffer(indices, index_format, 0);
            context.IASetPrimitiveTopology(D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
            context.VSSetShader(&pipeline.vertex_shader, None);
            context.VSSetConstantBuffers(0, Some(&[Some(constants.clone())]));
            context.PSSetShader(&pipeline.pixel_shader, None);
            context.PSSetSamplers(0, Some(&[Some(pipeline.sampler.clone())]));
            context.OMSetBlendState(&pipeline.blend, Some(&blend_factor), 0xffff_ffff);
            context.OMSetDepthStencilState(&pipeline.depth_stencil, 0);
            context.RSSetState(&pipeline.rasterizer);
        }
    }

    fn set_scissor(&mut self, rect: ScissorRect) {
        let rect = RECT {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        };
        unsafe {
            self.context.RSSetScissorRects(Some(&[rect]));
        }
    }

    fn bind_texture(&mut self, texture: &ID3D11ShaderResourceView) {
        unsafe {
            self.context.PSSetShaderResources(0, Some(&[Some(texture.clone())]));
        }
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) {
        unsafe {
            self.context.DrawIndexed(index_count, first_index, base_vertex);
        }
    }

    fn present(&mut self, vsync: bool) -> Result<()> {
        if let Some(swap_chain) = &self.swap_chain {
            unsafe {
                swap_chain.Present(u32::from(vsync), DXGI_PRESENT(0)).ok()?;
            }
        }
        Ok(())
    }

    fn release_surface(&mut self) {
        unsafe {
            self.context.OMSetRenderTargets(None, None);
        }
        self.render_target = None;
        if self.swap_chain.take().is_some() {
            debug!("Swap chain released");
        }
    }
}
